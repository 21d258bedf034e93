/// Task model
///
/// A task is a personal to-do item owned by exactly one user. Every read and
/// write is scoped by `(id, user_id)`; a task that belongs to someone else is
/// indistinguishable from one that does not exist.
///
/// # Lifecycle
///
/// ```text
/// create → update* → soft delete (is_deleted = TRUE, invisible from then on)
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'pending',
///     due_date DATE,
///     is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Task progress status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Pending,

    /// Being worked on
    InProgress,

    /// Done
    Completed,
}

impl TaskStatus {
    /// All statuses, in declaration order
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// Converts status to its stored/wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown task status: {}", s))
    }
}

/// Task row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Short title, 1-255 characters
    pub title: String,

    /// Optional longer description, up to 5000 characters
    pub description: Option<String>,

    /// Current status
    pub status: TaskStatus,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// Soft delete flag
    pub is_deleted: bool,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
///
/// The owner is passed separately so it always comes from the
/// authenticated identity.
#[derive(Debug, Clone, Default)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<NaiveDate>,
}

/// Partial task update
///
/// Outer `None` leaves the column untouched. For nullable columns,
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Option<NaiveDate>>,
}

/// A single column assignment produced from an [`UpdateTask`]
#[derive(Debug, Clone, PartialEq)]
pub enum TaskChange {
    Title(String),
    Description(Option<String>),
    Status(TaskStatus),
    DueDate(Option<NaiveDate>),
}

impl TaskChange {
    /// Column the change writes to
    pub fn column(&self) -> &'static str {
        match self {
            TaskChange::Title(_) => "title",
            TaskChange::Description(_) => "description",
            TaskChange::Status(_) => "status",
            TaskChange::DueDate(_) => "due_date",
        }
    }

    /// Applies the change to an in-memory task
    pub fn apply(self, task: &mut Task) {
        match self {
            TaskChange::Title(title) => task.title = title,
            TaskChange::Description(description) => task.description = description,
            TaskChange::Status(status) => task.status = status,
            TaskChange::DueDate(due_date) => task.due_date = due_date,
        }
    }
}

impl UpdateTask {
    /// Flattens the update into the list of columns that actually change
    pub fn into_changes(self) -> Vec<TaskChange> {
        let mut changes = Vec::with_capacity(4);

        if let Some(title) = self.title {
            changes.push(TaskChange::Title(title));
        }
        if let Some(description) = self.description {
            changes.push(TaskChange::Description(description));
        }
        if let Some(status) = self.status {
            changes.push(TaskChange::Status(status));
        }
        if let Some(due_date) = self.due_date {
            changes.push(TaskChange::DueDate(due_date));
        }

        changes
    }
}

/// Listing filters shared by `list` and `count`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Exact status match, compared against the stored string
    ///
    /// An unknown status simply matches nothing.
    pub status: Option<String>,

    /// Case-insensitive substring of the title
    pub search: Option<String>,
}

impl TaskFilter {
    /// Returns true if `task` passes both filters
    pub fn matches(&self, task: &Task) -> bool {
        let status_ok = self
            .status
            .as_deref()
            .map_or(true, |status| task.status.as_str() == status);

        let search_ok = self.search.as_deref().map_or(true, |needle| {
            task.title.to_lowercase().contains(&needle.to_lowercase())
        });

        status_ok && search_ok
    }
}

/// Page window for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 10;

    /// Number of pages needed for `total` rows at this limit
    pub fn page_count(&self, total: i64) -> i64 {
        if self.limit <= 0 || total <= 0 {
            return 0;
        }
        (total - 1) / self.limit + 1
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}
