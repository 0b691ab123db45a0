//! Error types for `gtd_core`.

use std::fmt;

/// The kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A task.
    Task,
    /// A project.
    Project,
    /// A tag.
    Tag,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task => write!(f, "task"),
            Self::Project => write!(f, "project"),
            Self::Tag => write!(f, "tag"),
        }
    }
}

/// Errors that can occur while working with the task store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON serialization error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Saving to or loading from the persistent store failed.
    ///
    /// Pending in-memory changes are kept so the action can be retried.
    #[error("Persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// The persisted store holds a value this version cannot interpret.
    #[error("Corrupt store data: {0}")]
    CorruptData(String),

    /// A recurrence type that is not one of days, weeks, months or years.
    #[error("Invalid recurrence unit: '{0}' (must be one of: days, weeks, months, years)")]
    InvalidRecurrenceUnit(String),

    /// Advancing a date left the representable calendar range.
    #[error("Date out of range")]
    DateOutOfRange,

    /// An external collaborator (reminders, notifications) failed.
    #[error("{service} failed: {message}")]
    ExternalService {
        /// Which collaborator failed.
        service: &'static str,
        /// The failure reported by the collaborator.
        message: String,
    },

    /// A referenced entity does not exist in the store.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// The kind of entity that was looked up.
        kind: EntityKind,
        /// The identifier that was not found.
        id: String,
    },
}

impl Error {
    /// Build a `NotFound` error for a task id.
    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::NotFound { kind: EntityKind::Task, id: id.into() }
    }

    /// Build a `NotFound` error for a project id.
    pub fn project_not_found(id: impl Into<String>) -> Self {
        Self::NotFound { kind: EntityKind::Project, id: id.into() }
    }

    /// Build a `NotFound` error for a tag id.
    pub fn tag_not_found(id: impl Into<String>) -> Self {
        Self::NotFound { kind: EntityKind::Tag, id: id.into() }
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
