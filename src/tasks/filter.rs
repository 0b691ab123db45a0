//! View filters: which logical list a task belongs to.
//!
//! Every view of the app and every reorder of a view goes through
//! [`ViewFilter::belongs_to`], so list membership is defined in exactly one
//! place.

use crate::tasks::display_policy::shown_in_lists;
use crate::tasks::graph::ObjectGraph;
use crate::tasks::models::{ListKind, Project, Tag, Task};
use chrono::NaiveDateTime;

/// A named, filter-defined view over tasks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogicalList {
    /// Unprocessed tasks without a project.
    Inbox,
    /// The focus subset of Next.
    Focus,
    /// Tasks due today or earlier.
    Due,
    /// Tasks hidden until a future day.
    Deferred,
    /// Tasks waiting on someone else.
    WaitingFor,
    /// Next actions outside the focus subset.
    Next,
    /// Someday/maybe.
    Someday,
    /// The full view of one list, honoring the deferred flag and project display policy.
    List(ListKind),
    /// A project's own task view.
    Project(String),
    /// All tasks carrying a tag.
    Tag(String),
}

/// UI mode flags that change list membership.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewMode {
    /// Show deferred tasks in list, project and tag views.
    pub show_deferred: bool,
}

/// Midnight at the start of the given moment's day.
#[must_use]
pub fn start_of_day(at: NaiveDateTime) -> NaiveDateTime {
    at.date().and_time(chrono::NaiveTime::MIN)
}

/// Check whether an active-dated task is due on or before `now`'s day.
#[must_use]
pub fn is_due(task: &Task, now: NaiveDateTime) -> bool {
    !task.completed && task.date_active && start_of_day(task.date_or(now)) <= start_of_day(now)
}

/// Check whether a task is hidden until a later day.
#[must_use]
pub fn is_deferred(task: &Task, now: NaiveDateTime) -> bool {
    !task.completed
        && task.date_active
        && task.hide_until_date
        && start_of_day(task.date_or(now)) > start_of_day(now)
}

/// Evaluates list membership against one snapshot of the graph.
#[derive(Debug, Clone, Copy)]
pub struct ViewFilter<'a> {
    graph: &'a ObjectGraph,
    now: NaiveDateTime,
    mode: ViewMode,
}

impl<'a> ViewFilter<'a> {
    /// Create a filter over `graph` evaluated at `now`.
    #[must_use]
    pub const fn new(graph: &'a ObjectGraph, now: NaiveDateTime, mode: ViewMode) -> Self {
        Self { graph, now, mode }
    }

    /// The moment the filter is evaluated at.
    #[must_use]
    pub const fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Whether a deferred task passes the deferred gate of list, project and tag views.
    fn passes_deferred_gate(&self, task: &Task) -> bool {
        self.mode.show_deferred
            || !task.date_active
            || !task.hide_until_date
            || start_of_day(task.date_or(self.now)) <= self.now
    }

    /// Check whether a task belongs to a logical list.
    #[must_use]
    pub fn belongs_to(&self, task: &Task, list: &LogicalList) -> bool {
        if task.completed {
            return false;
        }
        match list {
            LogicalList::Inbox => task.project.is_none() && task.list == ListKind::Inbox,
            LogicalList::Focus => task.list == ListKind::Next && task.focus,
            LogicalList::Due => is_due(task, self.now),
            LogicalList::Deferred => is_deferred(task, self.now),
            LogicalList::WaitingFor => task.waiting_for,
            LogicalList::Next => task.list == ListKind::Next && !task.focus,
            LogicalList::Someday => task.list == ListKind::Someday,
            LogicalList::List(kind) => {
                task.list == *kind
                    && self.passes_deferred_gate(task)
                    && shown_in_lists(self.graph, task)
            }
            LogicalList::Project(project_id) => {
                task.project.as_deref() == Some(project_id.as_str())
                    && self.passes_deferred_gate(task)
            }
            LogicalList::Tag(tag_id) => {
                task.has_tag(tag_id)
                    && self.passes_deferred_gate(task)
                    && shown_in_lists(self.graph, task)
            }
        }
    }

    /// The tasks of a logical list in display order.
    ///
    /// Project views sort by list then order; every other view sorts by
    /// order. Ties keep graph order.
    #[must_use]
    pub fn visible_tasks(&self, list: &LogicalList) -> Vec<&'a Task> {
        let mut tasks: Vec<&Task> =
            self.graph.tasks().iter().filter(|t| self.belongs_to(t, list)).collect();
        if matches!(list, LogicalList::Project(_)) {
            tasks.sort_by_key(|t| (t.list, t.order));
        } else {
            tasks.sort_by_key(|t| t.order);
        }
        tasks
    }

    /// IDs of the tasks of a logical list in display order.
    #[must_use]
    pub fn visible_task_ids(&self, list: &LogicalList) -> Vec<String> {
        self.visible_tasks(list).into_iter().map(|t| t.id.clone()).collect()
    }

    /// The manually ordered projects: incomplete and not the single-actions project.
    #[must_use]
    pub fn visible_projects(&self) -> Vec<&'a Project> {
        let mut projects: Vec<&Project> =
            self.graph.projects().iter().filter(|p| !p.completed && !p.single_actions).collect();
        projects.sort_by_key(|p| p.order);
        projects
    }

    /// The single-actions project, if one is designated.
    #[must_use]
    pub fn single_actions_project(&self) -> Option<&'a Project> {
        self.graph.projects().iter().find(|p| p.single_actions)
    }

    /// All tags in display order.
    #[must_use]
    pub fn visible_tags(&self) -> Vec<&'a Tag> {
        let mut tags: Vec<&Tag> = self.graph.tags().iter().collect();
        tags.sort_by_key(|t| t.order);
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::models::DisplayOption;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn now() -> NaiveDateTime {
        at(2024, 6, 10, 14)
    }

    fn task(list: ListKind) -> Task {
        Task::new("t".to_string(), "t", list, 0)
    }

    fn named_lists() -> [LogicalList; 4] {
        [LogicalList::Inbox, LogicalList::Focus, LogicalList::Next, LogicalList::Someday]
    }

    #[test]
    fn test_inbox() {
        let graph = ObjectGraph::new();
        let filter = ViewFilter::new(&graph, now(), ViewMode::default());
        let mut t = task(ListKind::Inbox);
        assert!(filter.belongs_to(&t, &LogicalList::Inbox));
        t.project = Some("p".to_string());
        assert!(!filter.belongs_to(&t, &LogicalList::Inbox));
    }

    #[test]
    fn test_focus_and_next_split() {
        let graph = ObjectGraph::new();
        let filter = ViewFilter::new(&graph, now(), ViewMode::default());
        let mut t = task(ListKind::Next);
        assert!(filter.belongs_to(&t, &LogicalList::Next));
        assert!(!filter.belongs_to(&t, &LogicalList::Focus));
        t.focus = true;
        assert!(!filter.belongs_to(&t, &LogicalList::Next));
        assert!(filter.belongs_to(&t, &LogicalList::Focus));
    }

    #[test]
    fn test_completed_excluded_everywhere() {
        let graph = ObjectGraph::new();
        let filter = ViewFilter::new(&graph, now(), ViewMode { show_deferred: true });
        let mut t = task(ListKind::Next);
        t.completed = true;
        t.waiting_for = true;
        t.date_active = true;
        t.date = Some(at(2024, 6, 1, 9));
        for list in [
            LogicalList::Inbox,
            LogicalList::Focus,
            LogicalList::Due,
            LogicalList::Deferred,
            LogicalList::WaitingFor,
            LogicalList::Next,
            LogicalList::Someday,
            LogicalList::List(ListKind::Next),
        ] {
            assert!(!filter.belongs_to(&t, &list), "{list:?}");
        }
    }

    #[test]
    fn test_due_uses_start_of_day() {
        let graph = ObjectGraph::new();
        let filter = ViewFilter::new(&graph, now(), ViewMode::default());
        let mut t = task(ListKind::Now);
        assert!(!filter.belongs_to(&t, &LogicalList::Due));

        t.date_active = true;
        t.date = Some(at(2024, 6, 10, 23));
        assert!(filter.belongs_to(&t, &LogicalList::Due), "later today is due");
        t.date = Some(at(2024, 6, 11, 0));
        assert!(!filter.belongs_to(&t, &LogicalList::Due));
        t.date = Some(at(2023, 1, 1, 0));
        assert!(filter.belongs_to(&t, &LogicalList::Due));
    }

    #[test]
    fn test_missing_date_defaults_to_now() {
        let graph = ObjectGraph::new();
        let filter = ViewFilter::new(&graph, now(), ViewMode::default());
        let mut t = task(ListKind::Now);
        t.date_active = true;
        t.hide_until_date = true;
        assert!(filter.belongs_to(&t, &LogicalList::Due));
        assert!(!filter.belongs_to(&t, &LogicalList::Deferred));
        assert!(filter.belongs_to(&t, &LogicalList::List(ListKind::Now)));
    }

    #[test]
    fn test_deferred_hidden_from_list_unless_shown() {
        let graph = ObjectGraph::new();
        let mut t = task(ListKind::Next);
        t.date_active = true;
        t.hide_until_date = true;
        t.date = Some(at(2024, 6, 12, 9));

        let hidden = ViewFilter::new(&graph, now(), ViewMode::default());
        assert!(hidden.belongs_to(&t, &LogicalList::Deferred));
        assert!(!hidden.belongs_to(&t, &LogicalList::List(ListKind::Next)));
        assert!(hidden.belongs_to(&t, &LogicalList::Next), "plain Next ignores deferral");

        let shown = ViewFilter::new(&graph, now(), ViewMode { show_deferred: true });
        assert!(shown.belongs_to(&t, &LogicalList::List(ListKind::Next)));

        t.hide_until_date = false;
        assert!(!hidden.belongs_to(&t, &LogicalList::Deferred));
        assert!(hidden.belongs_to(&t, &LogicalList::List(ListKind::Next)));
    }

    #[test]
    fn test_partition_is_exclusive() {
        let graph = ObjectGraph::new();
        let filter = ViewFilter::new(&graph, now(), ViewMode::default());
        for list in ListKind::ALL {
            for focus in [false, true] {
                for project in [None, Some("p".to_string())] {
                    let mut t = task(list);
                    t.focus = focus;
                    t.project = project;
                    let hits = named_lists().iter().filter(|l| filter.belongs_to(&t, l)).count();
                    assert!(hits <= 1, "{list:?} focus={focus}");
                }
            }
        }
    }

    #[test]
    fn test_waiting_for_is_independent() {
        let graph = ObjectGraph::new();
        let filter = ViewFilter::new(&graph, now(), ViewMode::default());
        let mut t = task(ListKind::Someday);
        t.waiting_for = true;
        assert!(filter.belongs_to(&t, &LogicalList::WaitingFor));
        assert!(filter.belongs_to(&t, &LogicalList::Someday));
    }

    #[test]
    fn test_list_view_applies_display_policy() {
        let mut graph = ObjectGraph::new();
        let pid = graph.create_project("Taxes", 0).id.clone();
        graph.project_mut(&pid).unwrap().display_option = DisplayOption::First;
        let a = graph.create_task("Collect receipts", ListKind::Next, 1).id.clone();
        let b = graph.create_task("File return", ListKind::Next, 2).id.clone();
        graph.task_mut(&a).unwrap().project = Some(pid.clone());
        graph.task_mut(&b).unwrap().project = Some(pid.clone());

        let filter = ViewFilter::new(&graph, now(), ViewMode::default());
        assert_eq!(filter.visible_task_ids(&LogicalList::List(ListKind::Next)), vec![a.clone()]);
        assert_eq!(filter.visible_task_ids(&LogicalList::Project(pid)), vec![a, b]);
    }

    #[test]
    fn test_project_view_sorts_by_list_then_order() {
        let mut graph = ObjectGraph::new();
        let pid = graph.create_project("Garden", 0).id.clone();
        let later = graph.create_task("Plant", ListKind::Someday, -5).id.clone();
        let sooner = graph.create_task("Dig", ListKind::Now, 9).id.clone();
        for id in [&later, &sooner] {
            graph.task_mut(id).unwrap().project = Some(pid.clone());
        }
        let filter = ViewFilter::new(&graph, now(), ViewMode::default());
        assert_eq!(filter.visible_task_ids(&LogicalList::Project(pid)), vec![sooner, later]);
    }

    #[test]
    fn test_tag_view() {
        let mut graph = ObjectGraph::new();
        let tag = graph.create_tag("phone", 0).id.clone();
        let tagged = graph.create_task("Call dentist", ListKind::Now, 0).id.clone();
        graph.create_task("Untagged", ListKind::Now, 1);
        graph.task_mut(&tagged).unwrap().tags.push(tag.clone());

        let filter = ViewFilter::new(&graph, now(), ViewMode::default());
        assert_eq!(filter.visible_task_ids(&LogicalList::Tag(tag)), vec![tagged]);
    }

    #[test]
    fn test_visible_tasks_sorted_stably() {
        let mut graph = ObjectGraph::new();
        let a = graph.create_task("a", ListKind::Inbox, 5).id.clone();
        let b = graph.create_task("b", ListKind::Inbox, 1).id.clone();
        let c = graph.create_task("c", ListKind::Inbox, 5).id.clone();
        let filter = ViewFilter::new(&graph, now(), ViewMode::default());
        assert_eq!(filter.visible_task_ids(&LogicalList::Inbox), vec![b, a, c]);
    }

    #[test]
    fn test_visible_projects_excludes_single_actions_and_completed() {
        let mut graph = ObjectGraph::new();
        let single = graph.create_project("Single actions", 0).id.clone();
        graph.project_mut(&single).unwrap().single_actions = true;
        let done = graph.create_project("Done", 1).id.clone();
        graph.project_mut(&done).unwrap().completed = true;
        let second = graph.create_project("Second", 3).id.clone();
        let first = graph.create_project("First", 2).id.clone();

        let filter = ViewFilter::new(&graph, now(), ViewMode::default());
        let ids: Vec<&str> = filter.visible_projects().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![first.as_str(), second.as_str()]);
        assert_eq!(filter.single_actions_project().map(|p| p.id.as_str()), Some(single.as_str()));
    }
}
