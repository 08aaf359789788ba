use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::download::DEFAULT_TIMEOUT;
use crate::error::Result;

const APP_PREFIX: &str = "qualitylock";

/// Timings of the enforcement loop (optional `[enforcer]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnforcerConfig {
    /// Attempts per page view before giving up silently.
    pub max_attempts: u32,
    /// Delay between two attempts, in milliseconds.
    pub retry_interval_ms: u64,
    /// Wait after a soft navigation so the player can re-initialize.
    pub navigation_debounce_ms: u64,
    /// Minimum spacing between two confirmations.
    pub notification_cooldown_ms: u64,
}

impl Default for EnforcerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_interval_ms: 3000,
            navigation_debounce_ms: 2000,
            notification_cooldown_ms: 5000,
        }
    }
}

impl EnforcerConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn navigation_debounce(&self) -> Duration {
        Duration::from_millis(self.navigation_debounce_ms)
    }

    pub fn notification_cooldown(&self) -> Duration {
        Duration::from_millis(self.notification_cooldown_ms)
    }
}

/// Global configuration loaded from `~/.config/qualitylock/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Timeout for the channel lookup request, in seconds.
    pub request_timeout_secs: u64,
    /// Where preferences are stored; defaults to the XDG data dir.
    pub preferences_path: Option<PathBuf>,
    pub enforcer: EnforcerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            preferences_path: None,
            enforcer: EnforcerConfig::default(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(toml::from_str(&data)?)
    }

    /// Load the XDG config file, or defaults when there is none.
    pub fn load() -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_PREFIX)?;
        match xdg_dirs.find_config_file("config.toml") {
            Some(path) => {
                tracing::debug!("loading config from {}", path.display());
                Self::load_from(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Configured preferences file, else `~/.local/share/qualitylock/preferences.json`.
    pub fn preferences_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.preferences_path {
            return Ok(path.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_PREFIX)?;
        Ok(xdg_dirs.place_data_file("preferences.json")?)
    }
}
