//! Model types for tasks, projects and tags.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// The primary bucket a task lives in.
///
/// The declaration order is significant: it is the order lists are compared
/// in when deciding which task of a project comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// Captured but not yet processed.
    #[default]
    Inbox,
    /// Must happen today.
    Now,
    /// Next actions.
    Next,
    /// Maybe later.
    Someday,
}

impl ListKind {
    /// All lists, in display order.
    pub const ALL: [Self; 4] = [Self::Inbox, Self::Now, Self::Next, Self::Someday];

    /// Parse a list from its persisted name.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a list name.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "inbox" => Ok(Self::Inbox),
            "now" => Ok(Self::Now),
            "next" => Ok(Self::Next),
            "someday" => Ok(Self::Someday),
            _ => Err(Error::CorruptData(format!("unknown list '{s}'"))),
        }
    }

    /// Get the persisted name of the list.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Now => "now",
            Self::Next => "next",
            Self::Someday => "someday",
        }
    }
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unit of a recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceUnit {
    /// Every `n` days.
    #[default]
    Days,
    /// Every `n` weeks.
    Weeks,
    /// Every `n` calendar months.
    Months,
    /// Every `n` calendar years.
    Years,
}

impl RecurrenceUnit {
    /// Parse a recurrence unit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecurrenceUnit`] for anything other than
    /// days, weeks, months or years.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "days" => Ok(Self::Days),
            "weeks" => Ok(Self::Weeks),
            "months" => Ok(Self::Months),
            "years" => Ok(Self::Years),
            _ => Err(Error::InvalidRecurrenceUnit(s.to_string())),
        }
    }

    /// Get the persisted name of the unit.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
            Self::Years => "years",
        }
    }
}

impl std::fmt::Display for RecurrenceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a project's tasks show up in cross-project list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayOption {
    /// Every incomplete task is shown.
    #[default]
    All,
    /// Only the first incomplete task is shown (sequential project).
    First,
}

impl DisplayOption {
    /// Parse a display option.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a display option.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "first" => Ok(Self::First),
            _ => Err(Error::CorruptData(format!("unknown display option '{s}'"))),
        }
    }

    /// Get the persisted name of the option.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::First => "first",
        }
    }
}

/// A unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, never changes.
    pub id: String,
    /// Short name; may be empty while being edited.
    pub name: String,
    /// Free-form note.
    pub note: String,
    /// The primary bucket.
    pub list: ListKind,
    /// Position within the task's list.
    pub order: i64,
    /// Terminal state.
    pub completed: bool,
    /// Pending completion, committed after a short delay.
    pub ticked: bool,
    /// Part of the focus subset of Next.
    pub focus: bool,
    /// Waiting on someone else.
    pub waiting_for: bool,
    /// Whether `date` is in effect.
    pub date_active: bool,
    /// Due date and time (local wall time).
    pub date: Option<NaiveDateTime>,
    /// Whether a notification fires at `date`.
    pub reminder_active: bool,
    /// Hide the task from default views until `date`'s day.
    pub hide_until_date: bool,
    /// Whether completing the task advances its date instead.
    pub recurring: bool,
    /// Recurrence interval count.
    pub recurrence: u32,
    /// Recurrence unit as persisted; `None` means days.
    pub recurrence_type: Option<String>,
    /// Optional URL.
    pub link: Option<String>,
    /// Owning project, if any.
    pub project: Option<String>,
    /// Tag ids.
    pub tags: Vec<String>,
    /// When the task was created.
    pub created_date: DateTime<Utc>,
    /// When the task was last changed.
    pub modified_date: DateTime<Utc>,
    /// When the task should next be reviewed.
    pub next_review_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new, incomplete task in the given list.
    #[must_use]
    pub fn new(id: String, name: impl Into<String>, list: ListKind, order: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            note: String::new(),
            list,
            order,
            completed: false,
            ticked: false,
            focus: false,
            waiting_for: false,
            date_active: false,
            date: None,
            reminder_active: false,
            hide_until_date: false,
            recurring: false,
            recurrence: 1,
            recurrence_type: None,
            link: None,
            project: None,
            tags: Vec::new(),
            created_date: now,
            modified_date: now,
            next_review_date: None,
        }
    }

    /// Whether the task is in the Someday list.
    #[must_use]
    pub fn someday(&self) -> bool {
        self.list == ListKind::Someday
    }

    /// The task's due date, or `now` when none is set.
    #[must_use]
    pub fn date_or(&self, now: NaiveDateTime) -> NaiveDateTime {
        self.date.unwrap_or(now)
    }

    /// The recurrence unit, defaulting to days.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecurrenceUnit`] if the persisted unit is unknown.
    pub fn recurrence_unit(&self) -> Result<RecurrenceUnit> {
        self.recurrence_type.as_deref().map_or(Ok(RecurrenceUnit::Days), RecurrenceUnit::from_str)
    }

    /// Whether the task carries the given tag.
    #[must_use]
    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|t| t == tag_id)
    }

    /// Record a modification.
    pub fn touch(&mut self) {
        self.modified_date = Utc::now();
    }
}

/// A grouping of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier.
    pub id: String,
    /// Project name.
    pub name: String,
    /// Free-form note.
    pub note: String,
    /// Icon name.
    pub icon: String,
    /// Color name.
    pub color: String,
    /// Position in the project list.
    pub order: i64,
    /// Whether the project is finished.
    pub completed: bool,
    /// How the project's tasks appear in list views.
    pub display_option: DisplayOption,
    /// The distinguished single-actions project.
    pub single_actions: bool,
    /// When the project was created.
    pub created_date: DateTime<Utc>,
    /// When the project was last changed.
    pub modified_date: DateTime<Utc>,
}

impl Project {
    /// Create a new project.
    #[must_use]
    pub fn new(id: String, name: impl Into<String>, order: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            note: String::new(),
            icon: "folder".to_string(),
            color: "blue".to_string(),
            order,
            completed: false,
            display_option: DisplayOption::All,
            single_actions: false,
            created_date: now,
            modified_date: now,
        }
    }

    /// Record a modification.
    pub fn touch(&mut self) {
        self.modified_date = Utc::now();
    }
}

/// A label attached to tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique identifier.
    pub id: String,
    /// Tag name.
    pub name: String,
    /// Position in the tag list.
    pub order: i64,
}

/// An entity with a manually controlled position.
pub trait Ordered {
    /// The entity's identifier.
    fn id(&self) -> &str;
    /// The entity's current position.
    fn order(&self) -> i64;
    /// Move the entity to a new position.
    fn set_order(&mut self, order: i64);
}

impl Ordered for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn order(&self) -> i64 {
        self.order
    }

    fn set_order(&mut self, order: i64) {
        if self.order != order {
            self.order = order;
            self.touch();
        }
    }
}

impl Ordered for Project {
    fn id(&self) -> &str {
        &self.id
    }

    fn order(&self) -> i64 {
        self.order
    }

    fn set_order(&mut self, order: i64) {
        if self.order != order {
            self.order = order;
            self.touch();
        }
    }
}

impl Ordered for Tag {
    fn id(&self) -> &str {
        &self.id
    }

    fn order(&self) -> i64 {
        self.order
    }

    fn set_order(&mut self, order: i64) {
        self.order = order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_ordering() {
        assert!(ListKind::Inbox < ListKind::Now);
        assert!(ListKind::Now < ListKind::Next);
        assert!(ListKind::Next < ListKind::Someday);
    }

    #[test]
    fn test_list_from_str() {
        assert_eq!(ListKind::from_str("Next").unwrap(), ListKind::Next);
        assert!(ListKind::from_str("later").is_err());
        for list in ListKind::ALL {
            assert_eq!(ListKind::from_str(list.as_str()).unwrap(), list);
        }
    }

    #[test]
    fn test_recurrence_unit_defaults_to_days() {
        let task = Task::new("t".to_string(), "Water plants", ListKind::Now, 0);
        assert_eq!(task.recurrence_unit().unwrap(), RecurrenceUnit::Days);
    }

    #[test]
    fn test_recurrence_unit_invalid() {
        let mut task = Task::new("t".to_string(), "Water plants", ListKind::Now, 0);
        task.recurrence_type = Some("fortnights".to_string());
        assert!(matches!(task.recurrence_unit(), Err(Error::InvalidRecurrenceUnit(u)) if u == "fortnights"));
    }

    #[test]
    fn test_someday_is_derived_from_list() {
        let mut task = Task::new("t".to_string(), "Learn the cello", ListKind::Next, 0);
        assert!(!task.someday());
        task.list = ListKind::Someday;
        assert!(task.someday());
    }

    #[test]
    fn test_set_order_touches_only_on_change() {
        let mut task = Task::new("t".to_string(), "x", ListKind::Inbox, 3);
        let before = task.modified_date;
        task.set_order(3);
        assert_eq!(task.modified_date, before);
        task.set_order(4);
        assert_eq!(task.order, 4);
        assert!(task.modified_date >= before);
    }

    #[test]
    fn test_display_option_round_trip_names() {
        assert_eq!(DisplayOption::from_str("First").unwrap(), DisplayOption::First);
        assert_eq!(DisplayOption::First.as_str(), "first");
        assert!(DisplayOption::from_str("some").is_err());
    }
}
