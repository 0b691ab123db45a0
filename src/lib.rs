//! # `gtd_core`
//!
//! Core of a Getting-Things-Done task organizer: logical list filters,
//! manual ordering, recurring tasks, persistence, and the notification
//! and reminders collaborators.

pub mod config;
pub mod error;
pub mod event_log;
pub mod notifications;
pub mod paths;
pub mod reminders;
pub mod tasks;
pub mod testing;
pub mod traits;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use traits::{NotificationScheduler, RemindersService, Store};

use event_log::EventLog;
use std::path::Path;
use tasks::SqliteStore;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Open the task database in a data directory, honoring its config.
///
/// Creates the directory if needed. When `debug_logging` is enabled, saves
/// are also appended to the event log.
///
/// # Errors
///
/// Returns an error if the directory or database cannot be opened.
pub fn open_store(data_dir: &Path, config: &AppConfig) -> Result<SqliteStore> {
    std::fs::create_dir_all(data_dir)?;
    let store = SqliteStore::open(paths::db_path(data_dir))?;
    if config.debug_logging {
        return Ok(store.with_event_log(EventLog::new(paths::events_path(data_dir))));
    }
    Ok(store)
}

/// Open the task database in the default data directory with its config.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined or the
/// database cannot be opened.
pub fn open_default_store() -> Result<(SqliteStore, AppConfig)> {
    let data_dir = paths::data_dir().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "could not determine home directory")
    })?;
    let config = AppConfig::load_or_default(&data_dir);
    let store = open_store(&data_dir, &config)?;
    Ok((store, config))
}
