//! Pairing API server for the Playlink relay.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Pairing endpoint** (`GET /api/player/token`) issuing fresh tokens
//! - **`WebSocket` endpoints** for the player (`/api/player/{token}/ws`)
//!   and its remotes (`/api/remote/{token}/ws`), each driven by a
//!   [`ConnectionPump`](playlink_hub::ConnectionPump)
//! - **Command endpoint** (`POST /api/player/{token}`) validating a
//!   command and relaying it to the player
//! - **Health endpoint** (`GET /api/health`) with live session counts
//! - **Static web remote** served from a configured directory, with
//!   `index.html` as the single-page-app fallback
//!
//! # Architecture
//!
//! Handlers never touch session state directly. They talk to the
//! [`Hub`](playlink_hub::Hub) owner task through its handle, so a slow
//! client can only ever slow down its own connection.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{start_server, ServerError};
pub use state::AppState;
