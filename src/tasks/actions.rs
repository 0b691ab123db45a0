//! Mutating actions on tasks, projects and tags.
//!
//! Each action reads the graph, applies its change, and saves exactly once.
//! A failed save propagates the error and leaves the change pending in the
//! graph, so calling `save` again retries it.

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::tasks::filter::{start_of_day, LogicalList, ViewFilter, ViewMode};
use crate::tasks::graph::ObjectGraph;
use crate::tasks::insertion::{next_project_order, next_tag_order, order_at, Position};
use crate::tasks::models::{DisplayOption, ListKind, RecurrenceUnit, Task};
use crate::tasks::recurrence::advance_by;
use crate::traits::Store;
use chrono::{DateTime, Days, NaiveDateTime, Utc};

/// Fields of a task being created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    /// Task name.
    pub name: String,
    /// Free-form note.
    pub note: String,
    /// Due date; setting one activates it.
    pub date: Option<NaiveDateTime>,
    /// Optional URL.
    pub link: Option<String>,
}

impl TaskDraft {
    /// A draft with just a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }
}

/// A partial update of a task. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::option_option)]
pub struct TaskEdit {
    /// New name.
    pub name: Option<String>,
    /// New note.
    pub note: Option<String>,
    /// New list. Leaving Next clears focus.
    pub list: Option<ListKind>,
    /// Focus flag. Focusing moves the task to Next.
    pub focus: Option<bool>,
    /// Waiting-for flag.
    pub waiting_for: Option<bool>,
    /// Whether the date is in effect. Disabling it disables the reminder.
    pub date_active: Option<bool>,
    /// Due date.
    pub date: Option<Option<NaiveDateTime>>,
    /// Reminder flag. Enabling it activates the date.
    pub reminder_active: Option<bool>,
    /// Hide-until-date flag.
    pub hide_until_date: Option<bool>,
    /// Recurring flag.
    pub recurring: Option<bool>,
    /// Recurrence count, at least 1.
    pub recurrence: Option<u32>,
    /// Recurrence unit; must name a known unit.
    pub recurrence_type: Option<Option<String>>,
    /// Link.
    pub link: Option<Option<String>>,
    /// Owning project; must exist.
    pub project: Option<Option<String>>,
    /// Next review date.
    pub next_review_date: Option<Option<DateTime<Utc>>>,
}

/// A partial update of a project. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectEdit {
    /// New name.
    pub name: Option<String>,
    /// New note.
    pub note: Option<String>,
    /// New icon.
    pub icon: Option<String>,
    /// New color.
    pub color: Option<String>,
    /// How the project's tasks appear in list views.
    pub display_option: Option<DisplayOption>,
}

fn require_task<'a>(store: &'a dyn Store, id: &str) -> Result<&'a Task> {
    store.graph().task(id).ok_or_else(|| Error::task_not_found(id))
}

fn require_project(store: &dyn Store, id: &str) -> Result<()> {
    store.graph().project(id).map(|_| ()).ok_or_else(|| Error::project_not_found(id))
}

fn require_tag(store: &dyn Store, id: &str) -> Result<()> {
    store.graph().tag(id).map(|_| ()).ok_or_else(|| Error::tag_not_found(id))
}

/// Order for placing `task_id` at `position` of a list view, ignoring the task itself.
fn order_in_list(
    store: &dyn Store,
    task_id: &str,
    list: ListKind,
    position: Position,
    mode: ViewMode,
    now: NaiveDateTime,
) -> i64 {
    let filter = ViewFilter::new(store.graph(), now, mode);
    let orders: Vec<i64> = filter
        .visible_tasks(&LogicalList::List(list))
        .iter()
        .filter(|t| t.id != task_id)
        .map(|t| t.order)
        .collect();
    order_at(&orders, position)
}

/// Create a task in the given view and save.
///
/// The task is shaped so it shows up in `target`: Focus sets `focus` in
/// Next, WaitingFor sets `waiting_for`, Due dates it today, Deferred hides
/// it until tomorrow, and project and tag views attach the project or tag.
/// Its order puts it at `position` of the target view. In a project view
/// the task joins the list of the task it lands next to, or Next when the
/// project has no visible tasks.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if a project or tag view names a missing
/// entity, or an error if the store fails to save.
pub fn create_task(
    store: &mut dyn Store,
    draft: TaskDraft,
    target: &LogicalList,
    position: Position,
    mode: ViewMode,
    now: NaiveDateTime,
) -> Result<String> {
    match target {
        LogicalList::Project(id) => require_project(store, id)?,
        LogicalList::Tag(id) => require_tag(store, id)?,
        _ => {}
    }

    let (list, order) = {
        let filter = ViewFilter::new(store.graph(), now, mode);
        let visible = filter.visible_tasks(target);
        let list = match target {
            // Project views are sectioned by list; join the section at the edge.
            LogicalList::Project(_) => {
                let edge = match position {
                    Position::Top => visible.first(),
                    Position::Bottom => visible.last(),
                };
                edge.map_or(ListKind::Next, |t| t.list)
            }
            LogicalList::Focus | LogicalList::Next => ListKind::Next,
            LogicalList::Someday => ListKind::Someday,
            LogicalList::List(kind) => *kind,
            _ => ListKind::Inbox,
        };
        let orders: Vec<i64> = visible
            .iter()
            .filter(|t| !matches!(target, LogicalList::Project(_)) || t.list == list)
            .map(|t| t.order)
            .collect();
        (list, order_at(&orders, position))
    };

    let task = store.graph_mut().create_task(&draft.name, list, order);
    task.note = draft.note;
    task.link = draft.link;
    if let Some(date) = draft.date {
        task.date_active = true;
        task.date = Some(date);
    }
    match target {
        LogicalList::Focus => task.focus = true,
        LogicalList::WaitingFor => task.waiting_for = true,
        LogicalList::Due => {
            task.date_active = true;
            task.date = Some(task.date.unwrap_or(now));
        }
        LogicalList::Deferred => {
            task.date_active = true;
            task.hide_until_date = true;
            task.date = start_of_day(now).checked_add_days(Days::new(1));
        }
        LogicalList::Project(id) => task.project = Some(id.clone()),
        LogicalList::Tag(id) => task.tags.push(id.clone()),
        _ => {}
    }
    let id = task.id.clone();

    tracing::debug!(task = %id, ?target, order, "created task");
    store.save()?;
    Ok(id)
}

/// Create a task using the configured default position and view mode.
///
/// # Errors
///
/// Same as [`create_task`].
pub fn add_task(
    store: &mut dyn Store,
    config: &AppConfig,
    draft: TaskDraft,
    target: &LogicalList,
    now: NaiveDateTime,
) -> Result<String> {
    create_task(store, draft, target, config.new_task_position, ViewMode::from(config), now)
}

/// Apply a partial edit to a task and save.
///
/// The task invariants hold afterwards: `focus` implies the Next list and
/// an active reminder implies an active date.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for a missing task or project,
/// [`Error::InvalidRecurrenceUnit`] for an unknown unit, or an error if the
/// store fails to save. Nothing is changed when validation fails.
pub fn edit_task(store: &mut dyn Store, id: &str, edit: TaskEdit) -> Result<()> {
    require_task(store, id)?;
    if let Some(Some(project)) = &edit.project {
        require_project(store, project)?;
    }
    if let Some(Some(unit)) = &edit.recurrence_type {
        RecurrenceUnit::from_str(unit)?;
    }

    let task = store.graph_mut().task_mut(id).ok_or_else(|| Error::task_not_found(id))?;
    if let Some(name) = edit.name {
        task.name = name;
    }
    if let Some(note) = edit.note {
        task.note = note;
    }
    if let Some(list) = edit.list {
        task.list = list;
    }
    if let Some(focus) = edit.focus {
        task.focus = focus;
        if focus {
            task.list = ListKind::Next;
        }
    }
    if task.list != ListKind::Next {
        task.focus = false;
    }
    if let Some(waiting_for) = edit.waiting_for {
        task.waiting_for = waiting_for;
    }
    if let Some(date) = edit.date {
        task.date = date;
    }
    if let Some(reminder_active) = edit.reminder_active {
        task.reminder_active = reminder_active;
        if reminder_active {
            task.date_active = true;
        }
    }
    if let Some(date_active) = edit.date_active {
        task.date_active = date_active;
    }
    if !task.date_active {
        task.reminder_active = false;
    }
    if let Some(hide) = edit.hide_until_date {
        task.hide_until_date = hide;
    }
    if let Some(recurring) = edit.recurring {
        task.recurring = recurring;
    }
    if let Some(recurrence) = edit.recurrence {
        task.recurrence = recurrence.max(1);
    }
    if let Some(recurrence_type) = edit.recurrence_type {
        task.recurrence_type = recurrence_type;
    }
    if let Some(link) = edit.link {
        task.link = link;
    }
    if let Some(project) = edit.project {
        task.project = project;
    }
    if let Some(review) = edit.next_review_date {
        task.next_review_date = review;
    }
    task.touch();

    tracing::debug!(task = %id, "edited task");
    store.save()
}

/// Move a task to another list, placing it at `position` of the destination view.
///
/// Focus is cleared unless the destination is Next.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the task is missing, or an error if the
/// store fails to save.
pub fn move_to_list(
    store: &mut dyn Store,
    id: &str,
    list: ListKind,
    position: Position,
    mode: ViewMode,
    now: NaiveDateTime,
) -> Result<()> {
    require_task(store, id)?;
    let order = order_in_list(store, id, list, position, mode, now);

    let task = store.graph_mut().task_mut(id).ok_or_else(|| Error::task_not_found(id))?;
    task.list = list;
    if list != ListKind::Next {
        task.focus = false;
    }
    task.order = order;
    task.touch();

    tracing::debug!(task = %id, list = list.as_str(), order, "moved task to list");
    store.save()
}

/// Set or clear a task's focus flag and save. Focusing moves the task to Next.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the task is missing, or an error if the
/// store fails to save.
pub fn set_focus(store: &mut dyn Store, id: &str, focus: bool) -> Result<()> {
    let task = store.graph_mut().task_mut(id).ok_or_else(|| Error::task_not_found(id))?;
    task.focus = focus;
    if focus {
        task.list = ListKind::Next;
    }
    task.touch();
    store.save()
}

/// Apply a completion to the graph without saving.
///
/// A recurring task is not completed: its date advances by its recurrence
/// interval (from `now` when it has no date). Either way the ticked flag is
/// cleared. On error the task is left unchanged.
pub(crate) fn mark_completed(graph: &mut ObjectGraph, id: &str, now: NaiveDateTime) -> Result<()> {
    let task = graph.task(id).ok_or_else(|| Error::task_not_found(id))?;
    let next_date = if task.recurring {
        let unit = task.recurrence_unit().map_err(|e| {
            tracing::warn!(task = %id, "cannot advance recurring task: {e}");
            e
        })?;
        Some(advance_by(task.date_or(now), unit, task.recurrence)?)
    } else {
        None
    };

    let task = graph.task_mut(id).ok_or_else(|| Error::task_not_found(id))?;
    match next_date {
        Some(date) => task.date = Some(date),
        None => task.completed = true,
    }
    task.ticked = false;
    task.touch();
    tracing::debug!(task = %id, recurring = next_date.is_some(), "completed task");
    Ok(())
}

/// Complete a task and save.
///
/// Recurring tasks advance their date and stay incomplete.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the task is missing,
/// [`Error::InvalidRecurrenceUnit`] or [`Error::DateOutOfRange`] if a
/// recurring task cannot advance (the task is left unchanged), or an error
/// if the store fails to save.
pub fn complete_task(store: &mut dyn Store, id: &str, now: NaiveDateTime) -> Result<()> {
    mark_completed(store.graph_mut(), id, now)?;
    store.save()
}

/// Mark a completed task incomplete, placing it at the top of its list, and save.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the task is missing, or an error if the
/// store fails to save.
pub fn uncomplete_task(
    store: &mut dyn Store,
    id: &str,
    mode: ViewMode,
    now: NaiveDateTime,
) -> Result<()> {
    let list = require_task(store, id)?.list;
    let order = order_in_list(store, id, list, Position::Top, mode, now);

    let task = store.graph_mut().task_mut(id).ok_or_else(|| Error::task_not_found(id))?;
    task.completed = false;
    task.ticked = false;
    task.order = order;
    task.touch();
    store.save()
}

/// Delete a task and save.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the task is missing, or an error if the
/// store fails to save.
pub fn delete_task(store: &mut dyn Store, id: &str) -> Result<()> {
    store.graph_mut().remove_task(id).ok_or_else(|| Error::task_not_found(id))?;
    tracing::debug!(task = %id, "deleted task");
    store.save()
}

/// Delete every completed task with a single save. Returns how many were deleted.
///
/// # Errors
///
/// Returns an error if the store fails to save.
pub fn delete_completed_tasks(store: &mut dyn Store) -> Result<usize> {
    let ids: Vec<String> =
        store.graph().tasks().iter().filter(|t| t.completed).map(|t| t.id.clone()).collect();
    let graph = store.graph_mut();
    for id in &ids {
        graph.remove_task(id);
    }

    tracing::debug!(count = ids.len(), "deleted completed tasks");
    store.save()?;
    Ok(ids.len())
}

/// Create a project at the bottom of the project list and save.
///
/// # Errors
///
/// Returns an error if the store fails to save.
pub fn create_project(store: &mut dyn Store, name: &str) -> Result<String> {
    let order =
        next_project_order(&ViewFilter::new(store.graph(), NaiveDateTime::MIN, ViewMode::default()));
    let id = store.graph_mut().create_project(name, order).id.clone();
    tracing::debug!(project = %id, order, "created project");
    store.save()?;
    Ok(id)
}

/// Apply a partial edit to a project and save.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the project is missing, or an error if
/// the store fails to save.
pub fn edit_project(store: &mut dyn Store, id: &str, edit: ProjectEdit) -> Result<()> {
    let project =
        store.graph_mut().project_mut(id).ok_or_else(|| Error::project_not_found(id))?;
    if let Some(name) = edit.name {
        project.name = name;
    }
    if let Some(note) = edit.note {
        project.note = note;
    }
    if let Some(icon) = edit.icon {
        project.icon = icon;
    }
    if let Some(color) = edit.color {
        project.color = color;
    }
    if let Some(display_option) = edit.display_option {
        project.display_option = display_option;
    }
    project.touch();
    store.save()
}

/// Mark a project completed and save. Its tasks are left as they are.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the project is missing, or an error if
/// the store fails to save.
pub fn complete_project(store: &mut dyn Store, id: &str) -> Result<()> {
    let project =
        store.graph_mut().project_mut(id).ok_or_else(|| Error::project_not_found(id))?;
    project.completed = true;
    project.touch();
    store.save()
}

/// Delete a project and save. Its tasks survive without a project.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the project is missing, or an error if
/// the store fails to save.
pub fn delete_project(store: &mut dyn Store, id: &str) -> Result<()> {
    store.graph_mut().remove_project(id).ok_or_else(|| Error::project_not_found(id))?;
    tracing::debug!(project = %id, "deleted project");
    store.save()
}

/// Designate the single-actions project, or clear the designation with `None`, and save.
///
/// At most one project carries the flag afterwards.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the project is missing, or an error if
/// the store fails to save.
pub fn set_single_actions(store: &mut dyn Store, id: Option<&str>) -> Result<()> {
    if let Some(id) = id {
        require_project(store, id)?;
    }

    let flagged: Vec<String> = store
        .graph()
        .projects()
        .iter()
        .filter(|p| p.single_actions != (Some(p.id.as_str()) == id))
        .map(|p| p.id.clone())
        .collect();
    let graph = store.graph_mut();
    for project_id in &flagged {
        if let Some(project) = graph.project_mut(project_id) {
            project.single_actions = Some(project_id.as_str()) == id;
            project.touch();
        }
    }
    store.save()
}

/// Create a tag at the bottom of the tag list and save.
///
/// # Errors
///
/// Returns an error if the store fails to save.
pub fn create_tag(store: &mut dyn Store, name: &str) -> Result<String> {
    let order =
        next_tag_order(&ViewFilter::new(store.graph(), NaiveDateTime::MIN, ViewMode::default()));
    let id = store.graph_mut().create_tag(name, order).id.clone();
    store.save()?;
    Ok(id)
}

/// Rename a tag and save.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the tag is missing, or an error if the
/// store fails to save.
pub fn rename_tag(store: &mut dyn Store, id: &str, name: &str) -> Result<()> {
    let tag = store.graph_mut().tag_mut(id).ok_or_else(|| Error::tag_not_found(id))?;
    tag.name = name.to_string();
    store.save()
}

/// Delete a tag, removing it from every task, and save.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the tag is missing, or an error if the
/// store fails to save.
pub fn delete_tag(store: &mut dyn Store, id: &str) -> Result<()> {
    store.graph_mut().remove_tag(id).ok_or_else(|| Error::tag_not_found(id))?;
    store.save()
}

/// Attach a tag to a task and save. Attaching it twice is a no-op.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the task or tag is missing, or an error
/// if the store fails to save.
pub fn tag_task(store: &mut dyn Store, task_id: &str, tag_id: &str) -> Result<()> {
    require_tag(store, tag_id)?;
    if require_task(store, task_id)?.has_tag(tag_id) {
        return Ok(());
    }
    let task =
        store.graph_mut().task_mut(task_id).ok_or_else(|| Error::task_not_found(task_id))?;
    task.tags.push(tag_id.to_string());
    task.touch();
    store.save()
}

/// Detach a tag from a task and save.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the task is missing, or an error if the
/// store fails to save.
pub fn untag_task(store: &mut dyn Store, task_id: &str, tag_id: &str) -> Result<()> {
    if !require_task(store, task_id)?.has_tag(tag_id) {
        return Ok(());
    }
    let task =
        store.graph_mut().task_mut(task_id).ok_or_else(|| Error::task_not_found(task_id))?;
    task.tags.retain(|t| t != tag_id);
    task.touch();
    store.save()
}
