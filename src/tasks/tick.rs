//! Delayed completion of ticked tasks.
//!
//! Ticking a task marks it done in the UI right away but only commits the
//! completion after a short delay, so an accidental tick can be undone.
//! The queue is driven by explicit clock values: the caller passes `now`
//! to every operation and calls [`TickQueue::commit_due`] when the next
//! commit is due.

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::tasks::actions::complete_task;
use crate::traits::Store;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::time::Duration;

/// Pending completions keyed by task id.
#[derive(Debug, Clone)]
pub struct TickQueue {
    delay: chrono::Duration,
    pending: BTreeMap<String, NaiveDateTime>,
}

impl Default for TickQueue {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl TickQueue {
    /// Create a queue committing ticks after `delay`.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay: chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::MAX),
            pending: BTreeMap::new(),
        }
    }

    /// Create a queue using the configured tick delay.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.tick_delay())
    }

    /// Tick a task: mark it ticked, save, and schedule its completion.
    ///
    /// Ticking an already pending task supersedes the earlier commit; the
    /// delay restarts from `now`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the task is missing, or an error if
    /// the store fails to save. The commit is scheduled either way once the
    /// task was found.
    pub fn tick(&mut self, store: &mut dyn Store, id: &str, now: NaiveDateTime) -> Result<()> {
        let task = store.graph_mut().task_mut(id).ok_or_else(|| Error::task_not_found(id))?;
        task.ticked = true;
        task.touch();

        let due = now.checked_add_signed(self.delay).unwrap_or(NaiveDateTime::MAX);
        if self.pending.insert(id.to_string(), due).is_some() {
            tracing::debug!(task = %id, "tick superseded pending commit");
        }
        store.save()
    }

    /// Untick a task: clear the flag, save, and cancel its pending commit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the task is missing, or an error if
    /// the store fails to save.
    pub fn untick(&mut self, store: &mut dyn Store, id: &str) -> Result<()> {
        self.pending.remove(id);
        let task = store.graph_mut().task_mut(id).ok_or_else(|| Error::task_not_found(id))?;
        task.ticked = false;
        task.touch();
        store.save()
    }

    /// Check if a task has a pending commit.
    #[must_use]
    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    /// Number of pending commits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// When the earliest pending commit is due.
    #[must_use]
    pub fn next_due(&self) -> Option<NaiveDateTime> {
        self.pending.values().min().copied()
    }

    /// Commit every completion due at `now`. Returns the completed task ids.
    ///
    /// Each task is re-read first: only tasks that still exist, are still
    /// ticked and are not yet completed get completed. Failures are logged
    /// and the entry is dropped; the task keeps its ticked flag.
    pub fn commit_due(&mut self, store: &mut dyn Store, now: NaiveDateTime) -> Vec<String> {
        let mut due: Vec<(NaiveDateTime, String)> = self
            .pending
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(id, at)| (*at, id.clone()))
            .collect();
        due.sort();

        let mut committed = Vec::new();
        for (_, id) in due {
            self.pending.remove(&id);
            let still_ticked =
                store.graph().task(&id).is_some_and(|task| task.ticked && !task.completed);
            if !still_ticked {
                tracing::debug!(task = %id, "skipping stale tick");
                continue;
            }
            match complete_task(store, &id, now) {
                Ok(()) => committed.push(id),
                Err(e) => tracing::warn!(task = %id, "could not commit tick: {e}"),
            }
        }
        committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::models::ListKind;
    use crate::testing::MemoryStore;

    fn t0() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 6, 10).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn ms(n: i64) -> chrono::Duration {
        chrono::Duration::milliseconds(n)
    }

    fn store_with(names: &[&str]) -> (MemoryStore, Vec<String>) {
        let mut store = MemoryStore::new();
        let ids = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                store.graph_mut().create_task(name, ListKind::Inbox, i64::try_from(i).unwrap()).id.clone()
            })
            .collect();
        store.save().unwrap();
        (store, ids)
    }

    #[test]
    fn test_commit_after_delay() {
        let (mut store, ids) = store_with(&["a"]);
        let mut queue = TickQueue::default();

        queue.tick(&mut store, &ids[0], t0()).unwrap();
        assert!(store.graph().task(&ids[0]).unwrap().ticked);
        assert_eq!(queue.next_due(), Some(t0() + ms(500)));

        assert!(queue.commit_due(&mut store, t0() + ms(499)).is_empty());
        assert!(!store.graph().task(&ids[0]).unwrap().completed);

        assert_eq!(queue.commit_due(&mut store, t0() + ms(500)), ids);
        let task = store.graph().task(&ids[0]).unwrap();
        assert!(task.completed);
        assert!(!task.ticked);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_untick_cancels() {
        let (mut store, ids) = store_with(&["a"]);
        let mut queue = TickQueue::new(Duration::from_millis(100));

        queue.tick(&mut store, &ids[0], t0()).unwrap();
        queue.untick(&mut store, &ids[0]).unwrap();
        assert!(!queue.is_pending(&ids[0]));
        assert!(queue.commit_due(&mut store, t0() + ms(1000)).is_empty());
        let task = store.graph().task(&ids[0]).unwrap();
        assert!(!task.ticked);
        assert!(!task.completed);
    }

    #[test]
    fn test_retick_supersedes() {
        let (mut store, ids) = store_with(&["a"]);
        let mut queue = TickQueue::default();

        queue.tick(&mut store, &ids[0], t0()).unwrap();
        queue.tick(&mut store, &ids[0], t0() + ms(300)).unwrap();
        assert_eq!(queue.len(), 1);

        assert!(queue.commit_due(&mut store, t0() + ms(600)).is_empty());
        assert_eq!(queue.commit_due(&mut store, t0() + ms(800)), ids);
    }

    #[test]
    fn test_stale_tick_is_skipped() {
        let (mut store, ids) = store_with(&["a", "b"]);
        let mut queue = TickQueue::default();
        queue.tick(&mut store, &ids[0], t0()).unwrap();
        queue.tick(&mut store, &ids[1], t0()).unwrap();

        // Unticked behind the queue's back.
        store.graph_mut().task_mut(&ids[0]).unwrap().ticked = false;
        store.graph_mut().remove_task(&ids[1]);

        assert!(queue.commit_due(&mut store, t0() + ms(500)).is_empty());
        assert!(!store.graph().task(&ids[0]).unwrap().completed);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_recurring_tick_advances_instead() {
        let (mut store, ids) = store_with(&["water plants"]);
        {
            let task = store.graph_mut().task_mut(&ids[0]).unwrap();
            task.recurring = true;
            task.date_active = true;
            task.date = Some(t0());
        }
        let mut queue = TickQueue::default();
        queue.tick(&mut store, &ids[0], t0()).unwrap();
        assert_eq!(queue.commit_due(&mut store, t0() + ms(500)), ids);

        let task = store.graph().task(&ids[0]).unwrap();
        assert!(!task.completed);
        assert!(!task.ticked);
        assert_eq!(task.date, Some(t0() + chrono::Duration::days(1)));
    }

    #[test]
    fn test_tick_missing_task() {
        let mut store = MemoryStore::new();
        let mut queue = TickQueue::default();
        assert!(queue.tick(&mut store, "missing", t0()).is_err());
        assert!(queue.is_empty());
    }
}
