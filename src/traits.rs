//! Collaborator traits.
//!
//! Every operation in this crate receives its collaborators explicitly so
//! tests can substitute in-memory doubles (see [`crate::testing`]).

use crate::error::Result;
use crate::tasks::graph::ObjectGraph;
use chrono::NaiveDateTime;

/// Trait for the persistent object store.
///
/// A store exposes its in-memory object graph for reading and mutation and
/// makes pending changes durable on [`Store::save`]. The production
/// implementation is [`crate::tasks::SqliteStore`].
pub trait Store {
    /// The current object graph.
    fn graph(&self) -> &ObjectGraph;

    /// The current object graph, for mutation.
    fn graph_mut(&mut self) -> &mut ObjectGraph;

    /// Persist all pending changes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Persistence`] (or `Io`) if the changes could
    /// not be written. Pending changes stay in the graph so the caller can
    /// retry.
    fn save(&mut self) -> Result<()>;
}

/// A calendar (reminder list) offered by the reminders service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarRef {
    /// Service-assigned identifier.
    pub id: String,
    /// Display title.
    pub title: String,
}

/// A reminder fetched from the reminders service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRef {
    /// Service-assigned identifier.
    pub id: String,
    /// Reminder title.
    pub title: String,
    /// Reminder notes.
    pub notes: Option<String>,
    /// Due date, if the reminder has one.
    pub due: Option<NaiveDateTime>,
}

/// Trait for the device reminders service.
pub trait RemindersService {
    /// List the calendars reminders can be imported from.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ExternalService`] if the service is unavailable.
    fn list_calendars(&self) -> Result<Vec<CalendarRef>>;

    /// Fetch every incomplete reminder in a calendar.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ExternalService`] if the fetch fails.
    fn fetch_incomplete_reminders(&self, calendar: &CalendarRef) -> Result<Vec<ReminderRef>>;

    /// Mark a reminder completed in the service.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ExternalService`] if the update fails.
    fn mark_completed(&self, reminder: &ReminderRef) -> Result<()>;
}

/// Trait for the local notification scheduler.
pub trait NotificationScheduler {
    /// Schedule a notification to fire at the given local time, replacing
    /// any pending notification with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ExternalService`] if scheduling fails.
    fn schedule(&self, id: &str, title: &str, at: NaiveDateTime) -> Result<()>;

    /// Cancel a pending notification. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ExternalService`] if cancelling fails.
    fn cancel(&self, id: &str) -> Result<()>;

    /// List the ids of all pending notifications.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ExternalService`] if the scheduler cannot be queried.
    fn list_pending(&self) -> Result<Vec<String>>;
}
