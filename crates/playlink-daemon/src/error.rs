//! Error types for the relay daemon.

/// Top-level error for the relay daemon.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: playlink_hub::ConfigError,
    },

    /// The pairing server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: playlink_server::ServerError,
    },

    /// The hub task panicked or was cancelled.
    #[error("hub task error: {source}")]
    Hub {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}
