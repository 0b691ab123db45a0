//! Task management core.
//!
//! This module provides the task organizer's behavior:
//! - Logical lists (Inbox, Focus, Due, Deferred, Waiting For, Next,
//!   Someday, per-list, per-project and per-tag views) defined by one filter
//! - Drag-and-drop reordering that renumbers only the affected slots
//! - Order planning for new tasks, projects and tags
//! - Recurring tasks that advance their date instead of completing
//! - Delayed completion of ticked tasks and multi-select bulk actions
//! - `SQLite` persistence with an audit log
//!
//! # Example
//!
//! ```no_run
//! use gtd_core::tasks::{create_task, move_task, LogicalList, Position, SqliteStore, TaskDraft, ViewMode};
//!
//! let mut store = SqliteStore::open("/tmp/tasks.sqlite3").unwrap();
//! let now = chrono::Local::now().naive_local();
//!
//! // Add two tasks to the Inbox
//! let mode = ViewMode::default();
//! create_task(&mut store, TaskDraft::named("Buy milk"), &LogicalList::Inbox, Position::Bottom, mode, now).unwrap();
//! create_task(&mut store, TaskDraft::named("Call mom"), &LogicalList::Inbox, Position::Bottom, mode, now).unwrap();
//!
//! // Drag the second one to the top
//! move_task(&mut store, &LogicalList::Inbox, mode, now, 1, 0).unwrap();
//! ```

pub mod actions;
pub mod display_policy;
pub mod filter;
pub mod graph;
pub mod id;
pub mod insertion;
pub mod models;
pub mod recurrence;
pub mod reorder;
pub mod selection;
pub mod store;
pub mod tick;

pub use actions::{
    add_task, complete_project, complete_task, create_project, create_tag, create_task,
    delete_completed_tasks, delete_project, delete_tag, delete_task, edit_project, edit_task,
    move_to_list, rename_tag, set_focus, set_single_actions, tag_task, uncomplete_task, untag_task,
    ProjectEdit, TaskDraft, TaskEdit,
};
pub use display_policy::is_first_incomplete_task;
pub use filter::{LogicalList, ViewFilter, ViewMode};
pub use graph::{ChangeSet, ObjectGraph, TaskSort};
pub use insertion::Position;
pub use models::{DisplayOption, ListKind, Ordered, Project, RecurrenceUnit, Tag, Task};
pub use recurrence::advance;
pub use reorder::{drop_target, move_project, move_tag, move_task};
pub use selection::Selection;
pub use store::{AuditEntry, SqliteStore};
pub use tick::TickQueue;
