//! `SQLite` implementation of the [`Store`] trait.
//!
//! The whole object graph is loaded when the store is opened. Mutations
//! happen in memory; [`Store::save`] writes every changed entity in one
//! transaction and records each write in an append-only audit log.

use crate::error::Result;
use crate::event_log::EventLog;
use crate::tasks::graph::{ChangeSet, ObjectGraph};
use crate::tasks::models::{DisplayOption, ListKind, Project, Tag, Task};
use crate::traits::Store;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Storage format of local due dates.
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TASK_COLUMNS: &str = "id, name, note, list, sort_order, completed, ticked, focus, waiting_for,
     date_active, date, reminder_active, hide_until_date, recurring, recurrence, recurrence_type,
     link, project_id, created_date, modified_date, next_review_date";

const PROJECT_COLUMNS: &str = "id, name, note, icon, color, sort_order, completed, display_option,
     single_actions, created_date, modified_date";

/// One row of the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Row id.
    pub id: i64,
    /// When the save happened.
    pub timestamp: String,
    /// `upsert` or `delete`.
    pub operation: String,
    /// `task`, `project` or `tag`.
    pub entity_kind: String,
    /// ID of the written entity.
    pub entity_id: String,
    /// JSON snapshot of the entity after an upsert.
    pub snapshot: Option<String>,
}

/// SQLite-based object store.
#[derive(Debug)]
pub struct SqliteStore {
    db_path: PathBuf,
    graph: ObjectGraph,
    events: Option<EventLog>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `db_path` and load its contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized or holds
    /// values that cannot be read back.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        let conn = Self::connect(&db_path)?;
        Self::init_schema(&conn)?;
        let graph = Self::load(&conn)?;
        tracing::debug!(
            path = %db_path.display(),
            tasks = graph.tasks().len(),
            projects = graph.projects().len(),
            tags = graph.tags().len(),
            "opened store"
        );
        Ok(Self { db_path, graph, events: None })
    }

    /// Record every successful save in the given event log.
    #[must_use]
    pub fn with_event_log(mut self, events: EventLog) -> Self {
        self.events = Some(events);
        self
    }

    /// Get the database path.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(db_path: &Path) -> Result<Connection> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL DEFAULT '',
                note TEXT NOT NULL DEFAULT '',
                icon TEXT NOT NULL DEFAULT '',
                color TEXT NOT NULL DEFAULT '',
                sort_order INTEGER NOT NULL DEFAULT 0,
                completed INTEGER NOT NULL DEFAULT 0,
                display_option TEXT NOT NULL DEFAULT 'all'
                    CHECK (display_option IN ('all', 'first')),
                single_actions INTEGER NOT NULL DEFAULT 0,
                created_date TEXT NOT NULL,
                modified_date TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tags (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL DEFAULT '',
                sort_order INTEGER NOT NULL DEFAULT 0
            );

            -- project_id is a weak reference: no foreign key
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL DEFAULT '',
                note TEXT NOT NULL DEFAULT '',
                list TEXT NOT NULL DEFAULT 'inbox'
                    CHECK (list IN ('inbox', 'now', 'next', 'someday')),
                sort_order INTEGER NOT NULL DEFAULT 0,
                completed INTEGER NOT NULL DEFAULT 0,
                ticked INTEGER NOT NULL DEFAULT 0,
                focus INTEGER NOT NULL DEFAULT 0,
                waiting_for INTEGER NOT NULL DEFAULT 0,
                date_active INTEGER NOT NULL DEFAULT 0,
                date TEXT,
                reminder_active INTEGER NOT NULL DEFAULT 0,
                hide_until_date INTEGER NOT NULL DEFAULT 0,
                recurring INTEGER NOT NULL DEFAULT 0,
                recurrence INTEGER NOT NULL DEFAULT 1,
                recurrence_type TEXT,
                link TEXT,
                project_id TEXT,
                created_date TEXT NOT NULL,
                modified_date TEXT NOT NULL,
                next_review_date TEXT
            );

            CREATE TABLE IF NOT EXISTS task_tags (
                task_id TEXT NOT NULL,
                tag_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (task_id, tag_id)
            );

            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL DEFAULT (datetime('now')),
                operation TEXT NOT NULL,
                entity_kind TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                snapshot TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_list_order ON tasks(list, sort_order);
            CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
            CREATE INDEX IF NOT EXISTS idx_task_tags_tag ON task_tags(tag_id);
            CREATE INDEX IF NOT EXISTS idx_audit_entity ON audit_log(entity_id);
            ",
        )?;
        Ok(())
    }

    fn load(conn: &Connection) -> Result<ObjectGraph> {
        let mut tags_by_task: HashMap<String, Vec<String>> = HashMap::new();
        let mut stmt =
            conn.prepare("SELECT task_id, tag_id FROM task_tags ORDER BY task_id, position")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get(1)?)))?;
        for row in rows {
            let (task_id, tag_id) = row?;
            tags_by_task.entry(task_id).or_default().push(tag_id);
        }

        let mut stmt = conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY rowid"))?;
        let mut tasks =
            stmt.query_map([], Self::parse_task)?.collect::<rusqlite::Result<Vec<Task>>>()?;
        for task in &mut tasks {
            task.tags = tags_by_task.remove(&task.id).unwrap_or_default();
        }

        let mut stmt =
            conn.prepare(&format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY rowid"))?;
        let projects =
            stmt.query_map([], Self::parse_project)?.collect::<rusqlite::Result<Vec<Project>>>()?;

        let mut stmt = conn.prepare("SELECT id, name, sort_order FROM tags ORDER BY rowid")?;
        let tags = stmt
            .query_map([], |row| Ok(Tag { id: row.get(0)?, name: row.get(1)?, order: row.get(2)? }))?
            .collect::<rusqlite::Result<Vec<Tag>>>()?;

        Ok(ObjectGraph::from_parts(tasks, projects, tags))
    }

    fn conversion_error(
        index: usize,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
    }

    fn get_utc(row: &rusqlite::Row, index: usize) -> rusqlite::Result<DateTime<Utc>> {
        let text: String = row.get(index)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| Self::conversion_error(index, e))
    }

    fn get_opt_utc(row: &rusqlite::Row, index: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
        let text: Option<String> = row.get(index)?;
        text.map(|t| {
            DateTime::parse_from_rfc3339(&t)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| Self::conversion_error(index, e))
        })
        .transpose()
    }

    fn get_opt_local(row: &rusqlite::Row, index: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
        let text: Option<String> = row.get(index)?;
        text.map(|t| {
            NaiveDateTime::parse_from_str(&t, DATE_FORMAT).map_err(|e| Self::conversion_error(index, e))
        })
        .transpose()
    }

    /// Parse a task from a row selected with `TASK_COLUMNS`. Tags are filled in separately.
    fn parse_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
        let list: String = row.get(3)?;
        Ok(Task {
            id: row.get(0)?,
            name: row.get(1)?,
            note: row.get(2)?,
            list: ListKind::from_str(&list).map_err(|e| Self::conversion_error(3, e))?,
            order: row.get(4)?,
            completed: row.get(5)?,
            ticked: row.get(6)?,
            focus: row.get(7)?,
            waiting_for: row.get(8)?,
            date_active: row.get(9)?,
            date: Self::get_opt_local(row, 10)?,
            reminder_active: row.get(11)?,
            hide_until_date: row.get(12)?,
            recurring: row.get(13)?,
            recurrence: row.get(14)?,
            recurrence_type: row.get(15)?,
            link: row.get(16)?,
            project: row.get(17)?,
            tags: Vec::new(),
            created_date: Self::get_utc(row, 18)?,
            modified_date: Self::get_utc(row, 19)?,
            next_review_date: Self::get_opt_utc(row, 20)?,
        })
    }

    fn parse_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
        let display: String = row.get(7)?;
        Ok(Project {
            id: row.get(0)?,
            name: row.get(1)?,
            note: row.get(2)?,
            icon: row.get(3)?,
            color: row.get(4)?,
            order: row.get(5)?,
            completed: row.get(6)?,
            display_option: DisplayOption::from_str(&display)
                .map_err(|e| Self::conversion_error(7, e))?,
            single_actions: row.get(8)?,
            created_date: Self::get_utc(row, 9)?,
            modified_date: Self::get_utc(row, 10)?,
        })
    }

    fn log_audit(
        tx: &Transaction,
        operation: &str,
        entity_kind: &str,
        entity_id: &str,
        snapshot: Option<&str>,
    ) -> Result<()> {
        tx.execute(
            "INSERT INTO audit_log (operation, entity_kind, entity_id, snapshot)
             VALUES (?1, ?2, ?3, ?4)",
            params![operation, entity_kind, entity_id, snapshot],
        )?;
        Ok(())
    }

    fn upsert_task(tx: &Transaction, task: &Task) -> Result<()> {
        tx.execute(
            &format!(
                "INSERT INTO tasks ({TASK_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                         ?17, ?18, ?19, ?20, ?21)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name, note = excluded.note, list = excluded.list,
                    sort_order = excluded.sort_order, completed = excluded.completed,
                    ticked = excluded.ticked, focus = excluded.focus,
                    waiting_for = excluded.waiting_for, date_active = excluded.date_active,
                    date = excluded.date, reminder_active = excluded.reminder_active,
                    hide_until_date = excluded.hide_until_date, recurring = excluded.recurring,
                    recurrence = excluded.recurrence, recurrence_type = excluded.recurrence_type,
                    link = excluded.link, project_id = excluded.project_id,
                    modified_date = excluded.modified_date,
                    next_review_date = excluded.next_review_date"
            ),
            params![
                task.id,
                task.name,
                task.note,
                task.list.as_str(),
                task.order,
                task.completed,
                task.ticked,
                task.focus,
                task.waiting_for,
                task.date_active,
                task.date.map(|d| d.format(DATE_FORMAT).to_string()),
                task.reminder_active,
                task.hide_until_date,
                task.recurring,
                task.recurrence,
                task.recurrence_type,
                task.link,
                task.project,
                task.created_date.to_rfc3339(),
                task.modified_date.to_rfc3339(),
                task.next_review_date.map(|d| d.to_rfc3339()),
            ],
        )?;

        tx.execute("DELETE FROM task_tags WHERE task_id = ?1", params![task.id])?;
        for (position, tag_id) in task.tags.iter().enumerate() {
            tx.execute(
                "INSERT OR IGNORE INTO task_tags (task_id, tag_id, position) VALUES (?1, ?2, ?3)",
                params![task.id, tag_id, i64::try_from(position).unwrap_or(i64::MAX)],
            )?;
        }
        Ok(())
    }

    fn upsert_project(tx: &Transaction, project: &Project) -> Result<()> {
        tx.execute(
            &format!(
                "INSERT INTO projects ({PROJECT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name, note = excluded.note, icon = excluded.icon,
                    color = excluded.color, sort_order = excluded.sort_order,
                    completed = excluded.completed, display_option = excluded.display_option,
                    single_actions = excluded.single_actions,
                    modified_date = excluded.modified_date"
            ),
            params![
                project.id,
                project.name,
                project.note,
                project.icon,
                project.color,
                project.order,
                project.completed,
                project.display_option.as_str(),
                project.single_actions,
                project.created_date.to_rfc3339(),
                project.modified_date.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn upsert_tag(tx: &Transaction, tag: &Tag) -> Result<()> {
        tx.execute(
            "INSERT INTO tags (id, name, sort_order) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, sort_order = excluded.sort_order",
            params![tag.id, tag.name, tag.order],
        )?;
        Ok(())
    }

    fn write_changes(&self, tx: &Transaction, changes: &ChangeSet) -> Result<()> {
        // Graph order, so new rows keep the graph's tie-breaking order on reload.
        for project in self.graph.projects().iter().filter(|p| changes.projects.contains(&p.id)) {
            Self::upsert_project(tx, project)?;
            let json = serde_json::to_string(project)?;
            Self::log_audit(tx, "upsert", "project", &project.id, Some(&json))?;
        }
        for tag in self.graph.tags().iter().filter(|t| changes.tags.contains(&t.id)) {
            Self::upsert_tag(tx, tag)?;
            let json = serde_json::to_string(tag)?;
            Self::log_audit(tx, "upsert", "tag", &tag.id, Some(&json))?;
        }
        for task in self.graph.tasks().iter().filter(|t| changes.tasks.contains(&t.id)) {
            Self::upsert_task(tx, task)?;
            let json = serde_json::to_string(task)?;
            Self::log_audit(tx, "upsert", "task", &task.id, Some(&json))?;
        }
        for id in &changes.deleted_tasks {
            tx.execute("DELETE FROM task_tags WHERE task_id = ?1", params![id])?;
            tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            Self::log_audit(tx, "delete", "task", id, None)?;
        }
        for id in &changes.deleted_tags {
            tx.execute("DELETE FROM task_tags WHERE tag_id = ?1", params![id])?;
            tx.execute("DELETE FROM tags WHERE id = ?1", params![id])?;
            Self::log_audit(tx, "delete", "tag", id, None)?;
        }
        for id in &changes.deleted_projects {
            tx.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
            Self::log_audit(tx, "delete", "project", id, None)?;
        }
        Ok(())
    }

    /// Read the audit log, newest first, optionally for one entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be read.
    pub fn audit_log(&self, entity_id: Option<&str>, limit: usize) -> Result<Vec<AuditEntry>> {
        let conn = Self::connect(&self.db_path)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, operation, entity_kind, entity_id, snapshot
             FROM audit_log
             WHERE ?1 IS NULL OR entity_id = ?1
             ORDER BY id DESC LIMIT ?2",
        )?;
        let entries = stmt
            .query_map(params![entity_id, limit], |row| {
                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    operation: row.get(2)?,
                    entity_kind: row.get(3)?,
                    entity_id: row.get(4)?,
                    snapshot: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}

impl Store for SqliteStore {
    fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    fn graph_mut(&mut self) -> &mut ObjectGraph {
        &mut self.graph
    }

    fn save(&mut self) -> Result<()> {
        if !self.graph.has_changes() {
            return Ok(());
        }

        let changes = self.graph.changes().clone();
        let mut conn = Self::connect(&self.db_path)?;
        let tx = conn.transaction()?;
        self.write_changes(&tx, &changes)?;
        tx.commit()?;

        self.graph.clear_changes();
        tracing::debug!(entities = changes.len(), "saved store");

        if let Some(events) = &self.events {
            events.record_save(&changes);
        }
        Ok(())
    }
}
