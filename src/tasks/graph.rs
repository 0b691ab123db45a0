//! In-memory object graph of tasks, projects and tags.
//!
//! The graph is the working set every operation reads and mutates. It
//! remembers which entities changed since the last save so a [`Store`]
//! implementation can persist exactly those in one go.
//!
//! Entities keep their insertion order, which is the stable tie-breaker
//! whenever two entities share an `order` value.
//!
//! [`Store`]: crate::traits::Store

use crate::tasks::id::generate_id;
use crate::tasks::models::{ListKind, Project, Tag, Task};
use std::collections::BTreeSet;

/// Keys the graph can sort tasks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSort {
    /// Manual order.
    Order,
    /// List (Inbox first), then manual order.
    ListThenOrder,
    /// Due date, undated tasks last.
    Date,
    /// Name, case-insensitive.
    Name,
    /// Most recently modified first.
    Modified,
}

/// Entities changed since the last successful save.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    /// Tasks created or modified.
    pub tasks: BTreeSet<String>,
    /// Projects created or modified.
    pub projects: BTreeSet<String>,
    /// Tags created or modified.
    pub tags: BTreeSet<String>,
    /// Tasks deleted.
    pub deleted_tasks: BTreeSet<String>,
    /// Projects deleted.
    pub deleted_projects: BTreeSet<String>,
    /// Tags deleted.
    pub deleted_tags: BTreeSet<String>,
}

impl ChangeSet {
    /// Check if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
            && self.projects.is_empty()
            && self.tags.is_empty()
            && self.deleted_tasks.is_empty()
            && self.deleted_projects.is_empty()
            && self.deleted_tags.is_empty()
    }

    /// Total number of changed entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
            + self.projects.len()
            + self.tags.len()
            + self.deleted_tasks.len()
            + self.deleted_projects.len()
            + self.deleted_tags.len()
    }
}

/// The in-memory working set.
#[derive(Debug, Default, Clone)]
pub struct ObjectGraph {
    tasks: Vec<Task>,
    projects: Vec<Project>,
    tags: Vec<Tag>,
    changes: ChangeSet,
}

impl ObjectGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from loaded entities. Nothing is marked as changed.
    #[must_use]
    pub fn from_parts(tasks: Vec<Task>, projects: Vec<Project>, tags: Vec<Tag>) -> Self {
        Self { tasks, projects, tags, changes: ChangeSet::default() }
    }

    /// All tasks, in insertion order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// All projects, in insertion order.
    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// All tags, in insertion order.
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Look up a task.
    #[must_use]
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Look up a task for modification. The task is marked as changed.
    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        self.changes.tasks.insert(task.id.clone());
        Some(task)
    }

    /// Look up a project.
    #[must_use]
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Look up a project for modification. The project is marked as changed.
    pub fn project_mut(&mut self, id: &str) -> Option<&mut Project> {
        let project = self.projects.iter_mut().find(|p| p.id == id)?;
        self.changes.projects.insert(project.id.clone());
        Some(project)
    }

    /// Look up a tag.
    #[must_use]
    pub fn tag(&self, id: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == id)
    }

    /// Look up a tag for modification. The tag is marked as changed.
    pub fn tag_mut(&mut self, id: &str) -> Option<&mut Tag> {
        let tag = self.tags.iter_mut().find(|t| t.id == id)?;
        self.changes.tags.insert(tag.id.clone());
        Some(tag)
    }

    /// Incomplete and completed tasks of a project, in insertion order.
    pub fn project_tasks<'a>(&'a self, project_id: &'a str) -> impl Iterator<Item = &'a Task> {
        self.tasks.iter().filter(move |t| t.project.as_deref() == Some(project_id))
    }

    /// Tasks sorted by the given key. The sort is stable.
    #[must_use]
    pub fn tasks_sorted(&self, key: TaskSort) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.iter().collect();
        match key {
            TaskSort::Order => tasks.sort_by_key(|t| t.order),
            TaskSort::ListThenOrder => tasks.sort_by_key(|t| (t.list, t.order)),
            TaskSort::Date => tasks.sort_by_key(|t| (t.date.is_none(), t.date)),
            TaskSort::Name => tasks.sort_by_cached_key(|t| t.name.to_lowercase()),
            TaskSort::Modified => tasks.sort_by(|a, b| b.modified_date.cmp(&a.modified_date)),
        }
        tasks
    }

    fn unique_id(&self, name: &str, fallback: &str) -> String {
        loop {
            let id = generate_id(name, fallback);
            let taken = self.tasks.iter().any(|t| t.id == id)
                || self.projects.iter().any(|p| p.id == id)
                || self.tags.iter().any(|t| t.id == id);
            if !taken {
                return id;
            }
        }
    }

    /// Create a task and add it to the graph.
    pub fn create_task(&mut self, name: &str, list: ListKind, order: i64) -> &mut Task {
        let id = self.unique_id(name, "task");
        self.insert_task(Task::new(id, name, list, order))
    }

    /// Add an existing task value to the graph.
    pub fn insert_task(&mut self, task: Task) -> &mut Task {
        self.changes.deleted_tasks.remove(&task.id);
        self.changes.tasks.insert(task.id.clone());
        self.tasks.push(task);
        let last = self.tasks.len() - 1;
        &mut self.tasks[last]
    }

    /// Create a project and add it to the graph.
    pub fn create_project(&mut self, name: &str, order: i64) -> &mut Project {
        let id = self.unique_id(name, "project");
        self.changes.projects.insert(id.clone());
        self.projects.push(Project::new(id, name, order));
        let last = self.projects.len() - 1;
        &mut self.projects[last]
    }

    /// Create a tag and add it to the graph.
    pub fn create_tag(&mut self, name: &str, order: i64) -> &mut Tag {
        let id = self.unique_id(name, "tag");
        self.changes.tags.insert(id.clone());
        self.tags.push(Tag { id, name: name.to_string(), order });
        let last = self.tags.len() - 1;
        &mut self.tags[last]
    }

    /// Remove a task. Returns the removed task.
    pub fn remove_task(&mut self, id: &str) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        let task = self.tasks.remove(index);
        self.changes.tasks.remove(id);
        self.changes.deleted_tasks.insert(task.id.clone());
        Some(task)
    }

    /// Remove a project, detaching its tasks.
    pub fn remove_project(&mut self, id: &str) -> Option<Project> {
        let index = self.projects.iter().position(|p| p.id == id)?;
        let project = self.projects.remove(index);
        for task in &mut self.tasks {
            if task.project.as_deref() == Some(id) {
                task.project = None;
                task.touch();
                self.changes.tasks.insert(task.id.clone());
            }
        }
        self.changes.projects.remove(id);
        self.changes.deleted_projects.insert(project.id.clone());
        Some(project)
    }

    /// Remove a tag, stripping it from every task.
    pub fn remove_tag(&mut self, id: &str) -> Option<Tag> {
        let index = self.tags.iter().position(|t| t.id == id)?;
        let tag = self.tags.remove(index);
        for task in &mut self.tasks {
            if task.has_tag(id) {
                task.tags.retain(|t| t != id);
                task.touch();
                self.changes.tasks.insert(task.id.clone());
            }
        }
        self.changes.tags.remove(id);
        self.changes.deleted_tags.insert(tag.id.clone());
        Some(tag)
    }

    /// Changes since the last save.
    #[must_use]
    pub const fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Check if there are unsaved changes.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Forget pending changes after they were persisted.
    pub fn clear_changes(&mut self) {
        self.changes = ChangeSet::default();
    }
}
