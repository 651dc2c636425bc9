//! Client configuration management.
//!
//! Holds the server address, extra handshake headers, reconnection policy and
//! logging preferences. Configuration is persisted as TOML on disk; every
//! field has a default so partial files load.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_RECONNECT_DELAY_MS;
use crate::error::{SioError, SioResult};
use crate::platform::Platform;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server connection settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Reconnection policy.
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Heartbeat behaviour.
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server connection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base server URL (e.g., "ws://127.0.0.1:3000").
    #[serde(default)]
    pub address: String,

    /// Extra headers sent with the upgrade request.
    #[serde(default)]
    pub custom_headers: HashMap<String, String>,
}

/// Reconnection policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Reconnect after a live connection fails.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Fixed delay between attempts in milliseconds.
    #[serde(default = "default_reconnect_delay")]
    pub delay_ms: u64,

    /// Maximum dial attempts per reconnect cycle (0 = unlimited).
    #[serde(default)]
    pub max_attempts: u32,
}

/// Heartbeat configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Originate a Ping every handshake `pingInterval` in addition to
    /// answering server pings.
    #[serde(default = "default_true")]
    pub client_ping: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses default location.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output.
    #[serde(default)]
    pub json_output: bool,
}

// Default value functions for serde

fn default_true() -> bool {
    true
}

fn default_reconnect_delay() -> u64 {
    DEFAULT_RECONNECT_DELAY_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: default_reconnect_delay(),
            max_attempts: 0,
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self { client_ping: true }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, or defaults if absent.
    pub fn load_default() -> SioResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> SioResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration as TOML, creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> SioResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| SioError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn default_config_path() -> SioResult<PathBuf> {
        Ok(Platform::config_dir()?.join("config.toml"))
    }

    pub fn effective_log_dir(&self) -> SioResult<PathBuf> {
        if self.logging.directory.is_empty() {
            Ok(Platform::data_dir()?.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }

    pub fn is_server_configured(&self) -> bool {
        !self.server.address.trim().is_empty()
    }
}
