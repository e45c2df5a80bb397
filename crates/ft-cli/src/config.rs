//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use ft_monitor::MonitorConfig;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the `usage/` day files.
    pub data_dir: PathBuf,
    pub tick_interval_ms: u64,
    pub autosave_interval_secs: u64,
    /// Snapshots buffered for `ft run` before new ones are dropped.
    pub snapshot_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        let defaults = MonitorConfig::default();
        Self {
            data_dir: dirs_data_path().unwrap_or_else(|| PathBuf::from(".")),
            tick_interval_ms: u64::try_from(defaults.tick_interval.as_millis()).unwrap_or(1000),
            autosave_interval_secs: defaults.autosave_interval.as_secs(),
            snapshot_buffer: defaults.snapshot_buffer,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // FT_DATA_DIR, FT_TICK_INTERVAL_MS, ...
        figment = figment.merge(Env::prefixed("FT_"));

        figment.extract()
    }

    /// Polling settings for the monitor. Zero intervals are raised to the
    /// smallest usable value.
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            tick_interval: Duration::from_millis(self.tick_interval_ms.max(1)),
            autosave_interval: Duration::from_secs(self.autosave_interval_secs.max(1)),
            snapshot_buffer: self.snapshot_buffer.max(1),
        }
    }
}

/// Returns the platform-specific config directory for ft.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ft"))
}

/// Returns the platform-specific data directory for ft.
///
/// On Linux: `~/.local/share/ft`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("ft"))
}
