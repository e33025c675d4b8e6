//! Shared application state for the pairing API server.

use playlink_hub::{Hub, PumpConfig, RelayConfig, TokenAllocator};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor. Holds only handles and configuration; all session state
/// lives in the hub's owner task.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Handle to the running hub.
    pub hub: Hub,
    /// Issues fresh pairing tokens.
    pub allocator: TokenAllocator,
    /// Keepalive and write-deadline settings for every connection.
    pub pump: PumpConfig,
}

impl AppState {
    /// Build the state for a running hub from the relay configuration.
    pub const fn new(hub: Hub, config: &RelayConfig) -> Self {
        Self {
            hub,
            allocator: TokenAllocator::from_config(&config.tokens),
            pump: PumpConfig::from_hub_config(&config.hub),
        }
    }
}
