//! Session registry, broadcast dispatcher, and connection pump for the
//! Playlink pairing relay.
//!
//! A player (the controlled media endpoint) and any number of remotes
//! share a pairing [`Token`](playlink_types::Token). This crate keeps
//! track of who is connected under which token and moves payloads between
//! them:
//!
//! - **Commands** flow from remotes to the single player of a token via
//!   [`Hub::send_to_player`].
//! - **State updates** flow from the player to every remote of the token
//!   via [`Hub::send_to_remotes`].
//!
//! # Architecture
//!
//! The [`Registry`] is owned by exactly one task, the hub dispatcher,
//! and is reached only through the [`Hub`] handle's message passing.
//! Delivery into a session's queue never blocks, so one stuck client
//! degrades only its own session. Each connection runs a
//! [`ConnectionPump`] that writes queued payloads and keepalives to the
//! wire and signals the hub when the connection goes away; the hub's
//! periodic sweep then reclaims the session.
//!
//! [`Registry`]: registry::Registry

pub mod allocator;
pub mod config;
pub mod error;
pub mod hub;
pub mod pump;
pub mod registry;
pub mod session;

// Re-export primary types for convenience.
pub use allocator::TokenAllocator;
pub use config::{ConfigError, HubConfig, RelayConfig};
pub use error::HubError;
pub use hub::{BroadcastMessage, Hub};
pub use pump::{ConnectionPump, PumpConfig, PumpExit};
pub use registry::HubStats;
pub use session::{DisconnectHandle, SessionHandle};
