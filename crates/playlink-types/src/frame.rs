//! Logical wire frames.
//!
//! The connection pump speaks in [`Frame`]s rather than a particular
//! `WebSocket` library's message type, so the same pump drives a real
//! socket in production and an in-memory channel in tests.

use std::sync::Arc;

/// An opaque, already-encoded payload (a JSON command or state update).
///
/// Shared by reference count so fan-out to many remotes does not copy
/// the bytes.
pub type Payload = Arc<str>;

/// One frame on a duplex connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text payload frame.
    Text(Payload),
    /// A binary frame. Never produced by the relay; ignored on read.
    Binary(Vec<u8>),
    /// Protocol keepalive.
    Ping(Vec<u8>),
    /// Reply to a keepalive.
    Pong(Vec<u8>),
    /// Close frame with an optional code and reason.
    Close(Option<CloseFrame>),
}

impl Frame {
    /// An empty keepalive frame.
    pub const fn keepalive() -> Self {
        Self::Ping(Vec::new())
    }
}

/// Close code and reason carried by a [`Frame::Close`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFrame {
    /// Numeric close code (RFC 6455 section 7.4).
    pub code: u16,
    /// Human-readable reason, possibly empty.
    pub reason: String,
}

impl CloseFrame {
    /// Normal closure.
    pub const NORMAL: u16 = 1000;
    /// The endpoint is going away (page navigation, server shutdown).
    pub const GOING_AWAY: u16 = 1001;

    /// Whether the code is one a well-behaved peer sends on an orderly close.
    pub const fn is_expected(&self) -> bool {
        self.code == Self::NORMAL || self.code == Self::GOING_AWAY
    }
}
