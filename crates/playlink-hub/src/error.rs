//! Error types for the hub.

use playlink_types::Token;

/// Errors surfaced by hub operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    /// A live player is already registered for the token.
    #[error("player with token {0} already exists")]
    PlayerExists(Token),

    /// No player is registered for the token.
    #[error("player with token {0} does not exist")]
    PlayerNotFound(Token),

    /// Every candidate token drawn was already in use.
    #[error("failed to allocate an unused token after {0} attempts")]
    TokensExhausted(u32),

    /// The hub owner task has stopped.
    #[error("hub is not running")]
    Unavailable,
}
