//! Path utilities for determining data storage locations.
//!
//! Data lives in `~/.gtd-core/` unless `GTD_CORE_DATA_DIR` points elsewhere.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "GTD_CORE_DATA_DIR";

/// The base directory name for data under the home directory.
const DATA_DIR_NAME: &str = ".gtd-core";

/// The database filename.
pub const DATABASE_FILENAME: &str = "tasks.sqlite3";

/// The configuration filename.
pub const CONFIG_FILENAME: &str = "config.yaml";

/// The debug event log filename.
pub const EVENTS_FILENAME: &str = "events.jsonl";

/// Get the data directory.
///
/// Returns `$GTD_CORE_DATA_DIR` if set and non-empty, otherwise
/// `~/.gtd-core/`, or `None` if the home directory cannot be determined.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::home_dir().map(|home| home.join(DATA_DIR_NAME)),
    }
}

/// Get the database path inside a data directory.
#[must_use]
pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILENAME)
}

/// Get the config path inside a data directory.
#[must_use]
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILENAME)
}

/// Get the event log path inside a data directory.
#[must_use]
pub fn events_path(data_dir: &Path) -> PathBuf {
    data_dir.join(EVENTS_FILENAME)
}
