//! Shared type definitions for the Playlink pairing relay.
//!
//! This crate holds the vocabulary every other crate in the workspace
//! speaks: pairing tokens, session identifiers, player commands, and the
//! transport-agnostic wire frames the connection pump writes. JSON-facing
//! types flow to `TypeScript` via `ts-rs` for the web remote.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for session identifiers
//! - [`token`] -- The pairing [`Token`] shared by a player and its remotes
//! - [`command`] -- Player commands and their validation
//! - [`frame`] -- Logical wire frames (text, ping, close)

pub mod command;
pub mod frame;
pub mod ids;
pub mod token;

// Re-export all public types at crate root for convenience.
pub use command::{CommandError, CommandRequest, PlayerAction, PlayerCommand};
pub use frame::{CloseFrame, Frame, Payload};
pub use ids::SessionId;
pub use token::{Token, TokenResponse, TOKEN_CHARSET};

/// Which side of a pairing a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// The controlled endpoint (the media player). At most one per token.
    Player,
    /// A controller endpoint. Any number per token.
    Remote,
}

impl core::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Player => f.write_str("player"),
            Self::Remote => f.write_str("remote"),
        }
    }
}
