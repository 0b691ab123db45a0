//! Testing utilities and mock implementations.
//!
//! These types are provided for use in tests. They may appear unused in
//! the library itself but are consumed by unit and integration tests.

#![allow(dead_code)]

use crate::error::{Error, Result};
use crate::tasks::graph::ObjectGraph;
use crate::traits::{CalendarRef, NotificationScheduler, ReminderRef, RemindersService, Store};
use chrono::NaiveDateTime;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// An in-memory store.
///
/// Counts saves and can be told to fail them, leaving pending changes in
/// the graph exactly like a failing durable store would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    graph: ObjectGraph,
    save_count: usize,
    fail_saves: bool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store around an existing graph.
    #[must_use]
    pub fn with_graph(graph: ObjectGraph) -> Self {
        Self { graph, ..Self::default() }
    }

    /// Number of successful saves.
    #[must_use]
    pub const fn save_count(&self) -> usize {
        self.save_count
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }
}

impl Store for MemoryStore {
    fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    fn graph_mut(&mut self) -> &mut ObjectGraph {
        &mut self.graph
    }

    fn save(&mut self) -> Result<()> {
        if self.fail_saves {
            return Err(std::io::Error::other("disk full").into());
        }
        self.graph.clear_changes();
        self.save_count += 1;
        Ok(())
    }
}

/// A notification scheduler that records pending notifications in memory.
#[derive(Debug, Default)]
pub struct MockNotificationScheduler {
    pending: RefCell<BTreeMap<String, (String, NaiveDateTime)>>,
    fail: Cell<bool>,
    schedule_calls: Cell<usize>,
}

impl MockNotificationScheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.fail.set(fail);
    }

    /// The firing time of a pending notification.
    #[must_use]
    pub fn pending_at(&self, id: &str) -> Option<NaiveDateTime> {
        self.pending.borrow().get(id).map(|(_, at)| *at)
    }

    /// Number of `schedule` calls made.
    #[must_use]
    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.get()
    }

    /// Insert a pending notification directly, bypassing `schedule`.
    pub fn insert_pending(&self, id: &str, at: NaiveDateTime) {
        self.pending.borrow_mut().insert(id.to_string(), (String::new(), at));
    }

    fn check(&self) -> Result<()> {
        if self.fail.get() {
            return Err(Error::ExternalService {
                service: "notifications",
                message: "not authorized".to_string(),
            });
        }
        Ok(())
    }
}

impl NotificationScheduler for MockNotificationScheduler {
    fn schedule(&self, id: &str, title: &str, at: NaiveDateTime) -> Result<()> {
        self.check()?;
        self.schedule_calls.set(self.schedule_calls.get() + 1);
        self.pending.borrow_mut().insert(id.to_string(), (title.to_string(), at));
        Ok(())
    }

    fn cancel(&self, id: &str) -> Result<()> {
        self.check()?;
        self.pending.borrow_mut().remove(id);
        Ok(())
    }

    fn list_pending(&self) -> Result<Vec<String>> {
        self.check()?;
        Ok(self.pending.borrow().keys().cloned().collect())
    }
}

/// A reminders service backed by a fixed set of reminders.
#[derive(Debug, Default)]
pub struct MockRemindersService {
    calendars: Vec<CalendarRef>,
    reminders: RefCell<BTreeMap<String, Vec<ReminderRef>>>,
    completed: RefCell<Vec<String>>,
    fail_fetch: bool,
    fail_mark: bool,
}

impl MockRemindersService {
    /// Create a service with no calendars.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a calendar holding the given reminders.
    #[must_use]
    pub fn with_calendar(mut self, calendar: CalendarRef, reminders: Vec<ReminderRef>) -> Self {
        self.reminders.borrow_mut().insert(calendar.id.clone(), reminders);
        self.calendars.push(calendar);
        self
    }

    /// Make fetches fail.
    #[must_use]
    pub const fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    /// Make marking reminders completed fail.
    #[must_use]
    pub const fn failing_mark(mut self) -> Self {
        self.fail_mark = true;
        self
    }

    /// IDs of reminders marked completed, in call order.
    #[must_use]
    pub fn completed(&self) -> Vec<String> {
        self.completed.borrow().clone()
    }
}

impl RemindersService for MockRemindersService {
    fn list_calendars(&self) -> Result<Vec<CalendarRef>> {
        Ok(self.calendars.clone())
    }

    fn fetch_incomplete_reminders(&self, calendar: &CalendarRef) -> Result<Vec<ReminderRef>> {
        if self.fail_fetch {
            return Err(Error::ExternalService {
                service: "reminders",
                message: "access denied".to_string(),
            });
        }
        let completed = self.completed.borrow();
        Ok(self
            .reminders
            .borrow()
            .get(&calendar.id)
            .map(|list| list.iter().filter(|r| !completed.contains(&r.id)).cloned().collect())
            .unwrap_or_default())
    }

    fn mark_completed(&self, reminder: &ReminderRef) -> Result<()> {
        if self.fail_mark {
            return Err(Error::ExternalService {
                service: "reminders",
                message: "read-only calendar".to_string(),
            });
        }
        self.completed.borrow_mut().push(reminder.id.clone());
        Ok(())
    }
}
