//! Reconciling scheduled notifications against tasks.
//!
//! Every task with an active reminder and a future date has exactly one
//! pending notification, identified as `task-<task id>`. Reconciling is
//! idempotent, so it can run on every poll tick and after every save.

use crate::error::Result;
use crate::tasks::graph::ObjectGraph;
use crate::tasks::models::Task;
use crate::traits::NotificationScheduler;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet};

/// Prefix of notification ids owned by this crate.
pub const NOTIFICATION_PREFIX: &str = "task-";

/// The notification id for a task.
#[must_use]
pub fn notification_id(task_id: &str) -> String {
    format!("{NOTIFICATION_PREFIX}{task_id}")
}

/// Check if a task should have a pending notification at `now`.
#[must_use]
pub fn wants_notification(task: &Task, now: NaiveDateTime) -> bool {
    task.reminder_active
        && task.date_active
        && !task.completed
        && task.date.is_some_and(|date| date > now)
}

/// Outcome of a reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Notifications newly scheduled.
    pub scheduled: usize,
    /// Stale notifications cancelled.
    pub cancelled: usize,
    /// Scheduler calls that failed.
    pub failures: usize,
}

/// Bring the scheduler's pending notifications in line with the graph.
///
/// Tasks that want a notification and have none pending get one; pending
/// task notifications whose task no longer wants one are cancelled.
/// Notifications with other prefixes are left alone. Scheduler failures
/// are logged and counted, never returned.
pub fn reconcile(
    graph: &ObjectGraph,
    scheduler: &dyn NotificationScheduler,
    now: NaiveDateTime,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    let pending: BTreeSet<String> = match scheduler.list_pending() {
        Ok(ids) => ids.into_iter().collect(),
        Err(e) => {
            tracing::warn!("could not list pending notifications: {e}");
            report.failures += 1;
            return report;
        }
    };

    let wanted: BTreeMap<String, &Task> = graph
        .tasks()
        .iter()
        .filter(|t| wants_notification(t, now))
        .map(|t| (notification_id(&t.id), t))
        .collect();

    for (id, task) in &wanted {
        if pending.contains(id) {
            continue;
        }
        let Some(at) = task.date else { continue };
        match scheduler.schedule(id, &task.name, at) {
            Ok(()) => report.scheduled += 1,
            Err(e) => {
                tracing::warn!(notification = %id, "could not schedule notification: {e}");
                report.failures += 1;
            }
        }
    }

    for id in pending.iter().filter(|id| id.starts_with(NOTIFICATION_PREFIX)) {
        if wanted.contains_key(id) {
            continue;
        }
        match scheduler.cancel(id) {
            Ok(()) => report.cancelled += 1,
            Err(e) => {
                tracing::warn!(notification = %id, "could not cancel notification: {e}");
                report.failures += 1;
            }
        }
    }

    if report != ReconcileReport::default() {
        tracing::debug!(
            scheduled = report.scheduled,
            cancelled = report.cancelled,
            failures = report.failures,
            "reconciled notifications"
        );
    }
    report
}

/// Replace the notification of a single task after its date or name changed.
///
/// Reconcile only schedules missing notifications, so a task whose date
/// moved keeps its old firing time until it is synced here.
///
/// # Errors
///
/// Returns [`crate::Error::ExternalService`] if the scheduler fails.
pub fn sync_task(
    task: &Task,
    scheduler: &dyn NotificationScheduler,
    now: NaiveDateTime,
) -> Result<()> {
    let id = notification_id(&task.id);
    scheduler.cancel(&id)?;
    match task.date {
        Some(at) if wants_notification(task, now) => scheduler.schedule(&id, &task.name, at),
        _ => Ok(()),
    }
}
