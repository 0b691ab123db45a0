//! Importing reminders from an external reminders service.
//!
//! Each incomplete reminder of a calendar becomes an Inbox task. The local
//! tasks are saved first; only then are the reminders marked completed in
//! the service, so a failure on the service side never loses a reminder.

use crate::error::{Error, Result};
use crate::tasks::filter::{LogicalList, ViewFilter, ViewMode};
use crate::tasks::insertion::order_at_bottom;
use crate::tasks::models::ListKind;
use crate::traits::{CalendarRef, RemindersService, Store};
use chrono::NaiveDateTime;

/// Outcome of an import.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// IDs of the tasks created, in import order.
    pub imported: Vec<String>,
    /// Reminders that could not be marked completed, with the error.
    pub mark_failures: Vec<(String, Error)>,
}

/// Import every incomplete reminder of `calendar` into the Inbox.
///
/// Tasks are appended to the bottom of the Inbox in the order the service
/// returns the reminders. A reminder's due date activates the task's date.
/// The store is saved once before any reminder is marked completed.
///
/// # Errors
///
/// Returns [`Error::ExternalService`] if the reminders cannot be fetched,
/// or an error if the store fails to save. Failing to mark a reminder
/// completed is not an error; it is reported in [`ImportReport::mark_failures`].
pub fn import_reminders(
    store: &mut dyn Store,
    service: &dyn RemindersService,
    calendar: &CalendarRef,
    now: NaiveDateTime,
) -> Result<ImportReport> {
    let reminders = service.fetch_incomplete_reminders(calendar)?;
    let mut report = ImportReport::default();
    if reminders.is_empty() {
        return Ok(report);
    }

    let mut order = {
        let filter = ViewFilter::new(store.graph(), now, ViewMode::default());
        let orders: Vec<i64> =
            filter.visible_tasks(&LogicalList::Inbox).iter().map(|t| t.order).collect();
        order_at_bottom(&orders)
    };

    let graph = store.graph_mut();
    for reminder in &reminders {
        let task = graph.create_task(&reminder.title, ListKind::Inbox, order);
        task.note = reminder.notes.clone().unwrap_or_default();
        if let Some(due) = reminder.due {
            task.date_active = true;
            task.date = Some(due);
        }
        report.imported.push(task.id.clone());
        order += 1;
    }
    store.save()?;

    for reminder in &reminders {
        if let Err(e) = service.mark_completed(reminder) {
            let e = match e {
                e @ Error::ExternalService { .. } => e,
                other => Error::ExternalService { service: "reminders", message: other.to_string() },
            };
            tracing::warn!(reminder = %reminder.id, "could not mark reminder completed: {e}");
            report.mark_failures.push((reminder.id.clone(), e));
        }
    }

    tracing::info!(
        calendar = %calendar.title,
        imported = report.imported.len(),
        mark_failures = report.mark_failures.len(),
        "imported reminders"
    );
    Ok(report)
}
