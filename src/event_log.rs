//! Debug event logging.
//!
//! When `debug_logging` is enabled in the config, every committed store save
//! is appended as a JSONL line to `events.jsonl` in the data directory, so
//! the sequence of writes can be inspected after the fact.

use crate::tasks::graph::ChangeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only JSONL log of committed saves.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    /// Log to the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a committed save.
    ///
    /// Errors are logged and otherwise ignored; event logging never fails a save.
    pub fn record_save(&self, changes: &ChangeSet) {
        let entry = serde_json::json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "operation": "save",
            "tasks": changes.tasks,
            "projects": changes.projects,
            "tags": changes.tags,
            "deleted_tasks": changes.deleted_tasks,
            "deleted_projects": changes.deleted_projects,
            "deleted_tags": changes.deleted_tags,
        });
        self.append(&entry);
    }

    fn append(&self, entry: &serde_json::Value) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("could not create event log directory: {e}");
                return;
            }
        }

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{entry}"));
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), "could not write event log: {e}");
        }
    }
}
