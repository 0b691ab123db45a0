//! Multi-select of tasks for bulk actions.
//!
//! The selection belongs to the UI session and is never persisted. Bulk
//! actions apply one change to every selected task and save once.

use crate::error::Result;
use crate::tasks::actions::mark_completed;
use crate::tasks::filter::{LogicalList, ViewFilter, ViewMode};
use crate::tasks::graph::TaskSort;
use crate::tasks::insertion::{order_at, Position};
use crate::tasks::models::ListKind;
use crate::traits::Store;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;

/// A set of selected task ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a task. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    /// Add a task to the selection.
    pub fn select(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    /// Check if a task is selected.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Clear the selection.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Number of selected tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Select every task visible in a logical list.
    pub fn select_all(&mut self, filter: &ViewFilter<'_>, list: &LogicalList) {
        self.ids.extend(filter.visible_task_ids(list));
    }

    /// Drop selected tasks no longer visible in a logical list.
    pub fn retain_visible(&mut self, filter: &ViewFilter<'_>, list: &LogicalList) {
        let visible: BTreeSet<String> = filter.visible_task_ids(list).into_iter().collect();
        self.ids.retain(|id| visible.contains(id));
    }

    /// Selected ids that still exist, in display order of the whole graph.
    fn existing(&self, store: &dyn Store) -> Vec<String> {
        store
            .graph()
            .tasks_sorted(TaskSort::ListThenOrder)
            .into_iter()
            .filter(|t| self.ids.contains(&t.id))
            .map(|t| t.id.clone())
            .collect()
    }

    /// Move every selected task to the bottom of `list` and save once.
    ///
    /// The tasks keep their relative order. Focus is cleared unless the
    /// destination is Next.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to save.
    pub fn move_to_list(
        &self,
        store: &mut dyn Store,
        list: ListKind,
        mode: ViewMode,
        now: NaiveDateTime,
    ) -> Result<usize> {
        let ids = self.existing(store);
        let mut order = {
            let filter = ViewFilter::new(store.graph(), now, mode);
            let orders: Vec<i64> = filter
                .visible_tasks(&LogicalList::List(list))
                .iter()
                .filter(|t| !self.ids.contains(&t.id))
                .map(|t| t.order)
                .collect();
            order_at(&orders, Position::Bottom)
        };

        let graph = store.graph_mut();
        for id in &ids {
            if let Some(task) = graph.task_mut(id) {
                task.list = list;
                if list != ListKind::Next {
                    task.focus = false;
                }
                task.order = order;
                task.touch();
                order += 1;
            }
        }

        tracing::debug!(count = ids.len(), list = list.as_str(), "moved selection");
        store.save()?;
        Ok(ids.len())
    }

    /// Complete every selected task and save once.
    ///
    /// Recurring tasks advance their date instead; a recurring task whose
    /// date cannot advance is logged and left unchanged. Returns how many
    /// tasks were changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to save.
    pub fn complete(&self, store: &mut dyn Store, now: NaiveDateTime) -> Result<usize> {
        let ids = self.existing(store);
        let mut changed = 0;
        let graph = store.graph_mut();
        for id in &ids {
            if graph.task(id).is_some_and(|t| t.completed) {
                continue;
            }
            // Errors were already logged; the task stays as it was.
            if mark_completed(graph, id, now).is_ok() {
                changed += 1;
            }
        }

        tracing::debug!(count = changed, "completed selection");
        store.save()?;
        Ok(changed)
    }

    /// Delete every selected task, save once, and clear the selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to save. The selection is kept
    /// in that case.
    pub fn delete(&mut self, store: &mut dyn Store) -> Result<usize> {
        let ids = self.existing(store);
        let graph = store.graph_mut();
        for id in &ids {
            graph.remove_task(id);
        }

        tracing::debug!(count = ids.len(), "deleted selection");
        store.save()?;
        self.clear();
        Ok(ids.len())
    }
}
