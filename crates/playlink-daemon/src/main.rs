//! Relay daemon for Playlink.
//!
//! Wires the hub owner task to the pairing server and runs both until
//! the process receives Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `playlink-config.yaml` (or the path in
//!    `PLAYLINK_CONFIG`), falling back to defaults
//! 2. Initialize structured logging (tracing)
//! 3. Spawn the hub
//! 4. Serve the pairing API until Ctrl-C
//! 5. Stop the hub, closing every remaining connection

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use playlink_hub::{Hub, RelayConfig};
use playlink_server::{start_server, AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::DaemonError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "playlink-config.yaml";

/// Application entry point for the relay daemon.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the listener cannot
/// bind, or the hub task fails.
#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    let (config, config_path) = load_config()?;

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("playlink starting");
    match config_path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        host = %config.server.host,
        port = config.server.port,
        keepalive_interval_ms = config.hub.keepalive_interval_ms,
        write_timeout_ms = config.hub.write_timeout_ms,
        token_length = config.tokens.length,
        "Relay configured"
    );

    let (hub, hub_task) = Hub::spawn(config.hub.clone());
    let state = Arc::new(AppState::new(hub.clone(), &config));

    let served = start_server(&config.server, state, shutdown_signal()).await;

    // Stop the hub even when serving failed, so open pumps are released.
    hub.shutdown().await;
    drop(hub);
    hub_task.await?;
    served?;

    info!("playlink stopped");
    Ok(())
}

/// Load the relay configuration.
///
/// Reads `PLAYLINK_CONFIG` if set, otherwise `playlink-config.yaml`. A
/// missing default file means defaults; a missing explicit file is an
/// error. Returns the path actually read, if any.
fn load_config() -> Result<(RelayConfig, Option<PathBuf>), DaemonError> {
    if let Some(path) = std::env::var_os("PLAYLINK_CONFIG").map(PathBuf::from) {
        let config = RelayConfig::from_file(&path)?;
        return Ok((config, Some(path)));
    }

    let path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if path.exists() {
        let config = RelayConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else {
        Ok((RelayConfig::from_env()?, None))
    }
}

/// Resolve on Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C, shutting down");
    }
    info!("shutdown signal received");
}
