//! Project display policy.
//!
//! Projects with [`DisplayOption::First`] are sequential: only their first
//! incomplete task shows up in cross-project views. "First" compares tasks
//! by list (Inbox < Now < Next < Someday) and then by order.

use crate::tasks::graph::ObjectGraph;
use crate::tasks::models::{DisplayOption, Task};

/// Check whether `task` is the first incomplete task among `project_tasks`.
///
/// `project_tasks` are the tasks of the task's project; completed ones are
/// skipped. Ties count as first.
#[must_use]
pub fn is_first_incomplete_task<'a>(
    task: &Task,
    project_tasks: impl IntoIterator<Item = &'a Task>,
) -> bool {
    let key = (task.list, task.order);
    !project_tasks
        .into_iter()
        .any(|other| !other.completed && other.id != task.id && (other.list, other.order) < key)
}

/// Check whether a task may appear in cross-project list views.
///
/// Tasks without a project, or whose project is missing or shows all its
/// tasks, always pass.
#[must_use]
pub fn shown_in_lists(graph: &ObjectGraph, task: &Task) -> bool {
    let Some(project_id) = task.project.as_deref() else {
        return true;
    };
    match graph.project(project_id) {
        Some(project) if project.display_option == DisplayOption::First => {
            is_first_incomplete_task(task, graph.project_tasks(project_id))
        }
        _ => true,
    }
}
