//! Configuration management.
//!
//! Settings live in `config.yaml` inside the data directory. Missing keys
//! take their defaults, so an empty file is a valid configuration.

use crate::error::Result;
use crate::paths;
use crate::tasks::filter::ViewMode;
use crate::tasks::insertion::Position;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const fn default_tick_delay_ms() -> u64 {
    500
}

const fn default_notification_poll_secs() -> u64 {
    300
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Show deferred tasks in list, project and tag views.
    #[serde(default)]
    pub show_deferred: bool,

    /// Delay between ticking a task and committing its completion.
    #[serde(default = "default_tick_delay_ms")]
    pub tick_delay_ms: u64,

    /// How often scheduled notifications are reconciled against tasks.
    #[serde(default = "default_notification_poll_secs")]
    pub notification_poll_secs: u64,

    /// Where new tasks are placed in their list.
    #[serde(default)]
    pub new_task_position: Position,

    /// Append every committed save to the event log.
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            show_deferred: false,
            tick_delay_ms: default_tick_delay_ms(),
            notification_poll_secs: default_notification_poll_secs(),
            new_task_position: Position::Bottom,
            debug_logging: false,
        }
    }
}

impl AppConfig {
    /// Load config from a data directory, returning None if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(data_dir: &Path) -> Result<Option<Self>> {
        let config_path = paths::config_path(data_dir);
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)?;
        if content.trim().is_empty() {
            return Ok(Some(Self::default()));
        }
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(Some(config))
    }

    /// Load config from a data directory, falling back to defaults.
    ///
    /// An unreadable file is logged and ignored.
    #[must_use]
    pub fn load_or_default(data_dir: &Path) -> Self {
        match Self::load_from(data_dir) {
            Ok(config) => config.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("could not load config, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Save config to a data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, data_dir: &Path) -> Result<()> {
        let config_path = paths::config_path(data_dir);
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// The tick commit delay.
    #[must_use]
    pub const fn tick_delay(&self) -> Duration {
        Duration::from_millis(self.tick_delay_ms)
    }

    /// The notification reconcile interval.
    #[must_use]
    pub const fn notification_poll_interval(&self) -> Duration {
        Duration::from_secs(self.notification_poll_secs)
    }
}

impl From<&AppConfig> for ViewMode {
    fn from(config: &AppConfig) -> Self {
        Self { show_deferred: config.show_deferred }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(!config.show_deferred);
        assert_eq!(config.tick_delay(), Duration::from_millis(500));
        assert_eq!(config.notification_poll_interval(), Duration::from_secs(300));
        assert_eq!(config.new_task_position, Position::Bottom);
    }

    #[test]
    fn test_view_mode_from_config() {
        assert_eq!(ViewMode::from(&AppConfig::default()), ViewMode::default());
        let config = AppConfig { show_deferred: true, ..AppConfig::default() };
        assert!(ViewMode::from(&config).show_deferred);
    }

    #[test]
    fn test_load_missing_returns_none() {
        let dir = TempDir::new().unwrap();
        assert!(AppConfig::load_from(dir.path()).unwrap().is_none());
        assert_eq!(AppConfig::load_or_default(dir.path()), AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            show_deferred: true,
            tick_delay_ms: 250,
            new_task_position: Position::Top,
            ..Default::default()
        };
        config.save_to(dir.path()).unwrap();
        assert_eq!(AppConfig::load_from(dir.path()).unwrap(), Some(config));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(paths::config_path(dir.path()), "show_deferred: true\n").unwrap();
        let config = AppConfig::load_from(dir.path()).unwrap().unwrap();
        assert!(config.show_deferred);
        assert_eq!(config.tick_delay_ms, 500);
    }

    #[test]
    fn test_empty_file_is_default() {
        let dir = TempDir::new().unwrap();
        std::fs::write(paths::config_path(dir.path()), "").unwrap();
        assert_eq!(AppConfig::load_from(dir.path()).unwrap(), Some(AppConfig::default()));
    }

    #[test]
    fn test_invalid_yaml_falls_back() {
        let dir = TempDir::new().unwrap();
        std::fs::write(paths::config_path(dir.path()), "tick_delay_ms: [not a number").unwrap();
        assert!(AppConfig::load_from(dir.path()).is_err());
        assert_eq!(AppConfig::load_or_default(dir.path()), AppConfig::default());
    }
}
