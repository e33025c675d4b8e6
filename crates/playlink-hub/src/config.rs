//! Configuration loading and typed config structures for the Playlink relay.
//!
//! The configuration lives in `playlink-config.yaml`. Every field has a
//! default matching the behavior of the deployed relay (1 s keepalive,
//! 3 s write deadline, 8-character tokens, 5 allocation attempts), so a
//! missing file or a partial file is always valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid environment override {name}: {message}")]
    Env {
        /// The variable name.
        name: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// A value parsed but is outside its allowed range.
    #[error("invalid config value {field}: {message}")]
    Invalid {
        /// The offending field, as `section.key`.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level relay configuration.
///
/// Mirrors the structure of `playlink-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RelayConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Hub timing and queue sizes.
    #[serde(default)]
    pub hub: HubConfig,

    /// Pairing token issuance.
    #[serde(default)]
    pub tokens: TokenConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RelayConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the listener:
    /// - `PORT` overrides `server.port`
    /// - `PLAYLINK_HOST` overrides `server.host`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.server.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides
    /// are applied.
    ///
    /// Zero-length timing values are rejected; a timer cannot tick every
    /// zero milliseconds.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.hub.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied, for running without
    /// a config file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.server.apply_env_overrides()?;
        Ok(config)
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the built web remote. When set, unknown paths
    /// fall back to its `index.html`.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Override listener values from `PORT` and `PLAYLINK_HOST`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("PORT") {
            self.port = val.parse().map_err(|e| ConfigError::Env {
                name: "PORT",
                message: format!("{e}"),
            })?;
        }
        if let Ok(val) = std::env::var("PLAYLINK_HOST") {
            self.host = val;
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

/// Shortest period handed to a timer. Configs built in code skip
/// [`HubConfig::validate`], so timers clamp to this instead of panicking.
pub(crate) const MIN_TICK: Duration = Duration::from_millis(1);

/// Hub timing and queue configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HubConfig {
    /// Interval between keepalive pings on every connection.
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,

    /// Deadline for a single frame write before the connection is dropped.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    /// Interval between sweeps for disconnected sessions.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Per-session outbound queue capacity. Payloads beyond it are dropped.
    #[serde(default = "default_session_buffer")]
    pub session_buffer: usize,

    /// Capacity of the hub's broadcast and control queues.
    #[serde(default = "default_broadcast_buffer")]
    pub broadcast_buffer: usize,
}

impl HubConfig {
    /// Check that every interval and deadline is non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timings = [
            ("hub.keepalive_interval_ms", self.keepalive_interval_ms),
            ("hub.write_timeout_ms", self.write_timeout_ms),
            ("hub.sweep_interval_ms", self.sweep_interval_ms),
        ];
        match timings.into_iter().find(|&(_, ms)| ms == 0) {
            Some((field, _)) => Err(ConfigError::Invalid {
                field,
                message: String::from("must be greater than zero"),
            }),
            None => Ok(()),
        }
    }

    /// Keepalive interval as a [`Duration`].
    pub const fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }

    /// Write deadline as a [`Duration`].
    pub const fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Sweep interval as a [`Duration`].
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            keepalive_interval_ms: default_keepalive_interval_ms(),
            write_timeout_ms: default_write_timeout_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
            session_buffer: default_session_buffer(),
            broadcast_buffer: default_broadcast_buffer(),
        }
    }
}

/// Pairing token issuance configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenConfig {
    /// Number of characters in an issued token.
    #[serde(default = "default_token_length")]
    pub length: usize,

    /// Attempts to find an unused token before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            length: default_token_length(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

const fn default_keepalive_interval_ms() -> u64 {
    1_000
}

const fn default_write_timeout_ms() -> u64 {
    3_000
}

const fn default_sweep_interval_ms() -> u64 {
    250
}

const fn default_session_buffer() -> usize {
    32
}

const fn default_broadcast_buffer() -> usize {
    1_024
}

const fn default_token_length() -> usize {
    8
}

const fn default_max_attempts() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_owned()
}
