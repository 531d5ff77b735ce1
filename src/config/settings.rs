//! Configuration settings for wellkeep.
//!
//! Settings are loaded from `~/.wellkeep/config.yaml`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WellkeepError;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Background sync settings.
    pub sync: SyncConfig,
    /// Remote backend settings.
    pub remote: RemoteConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Background sync settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Push edits to the remote store when signed in.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between periodic re-syncs.
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
}

/// Remote backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the backend, e.g. `https://project.example.co`.
    #[serde(default)]
    pub url: Option<String>,
    /// Public API key sent with every request.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions for serde
const fn default_true() -> bool {
    true
}

const fn default_interval_seconds() -> u64 {
    30
}

const fn default_timeout_seconds() -> u64 {
    15
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            interval_seconds: default_interval_seconds(),
        }
    }
}

impl SyncConfig {
    /// Periodic sync interval. Never zero.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(1))
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl RemoteConfig {
    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, WellkeepError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            WellkeepError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            WellkeepError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), WellkeepError> {
        let contents = serde_yaml::to_string(self)
            .map_err(|e| WellkeepError::Config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, contents).map_err(|e| {
            WellkeepError::Config(format!(
                "Failed to write config file {}: {e}",
                path.display()
            ))
        })
    }
}
