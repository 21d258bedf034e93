/// Persistence seams for users and tasks
///
/// Handlers and the credential store talk to storage only through the
/// [`UserStore`] and [`TaskStore`] traits. Two backends implement both:
///
/// - [`postgres::PgStore`]: the production backend over a `PgPool`
/// - [`memory::MemoryStore`]: an in-process backend with the same
///   uniqueness, foreign-key and ownership rules
///
/// Every mutation is a single statement, so uniqueness and ownership are
/// enforced by the backend itself rather than by in-process locking.

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::password::PasswordError;
use crate::models::task::{CreateTask, Page, Task, TaskFilter, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User, UserCredentials};

pub mod memory;
pub mod postgres;

/// PostgreSQL SQLSTATE for unique_violation
pub const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for not_null_violation
pub const NOT_NULL_VIOLATION: &str = "23502";

/// PostgreSQL SQLSTATE for foreign_key_violation
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (e.g. duplicate email)
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// A NOT NULL column was left empty
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A foreign key points at a row that does not exist
    #[error("Dangling reference: {0}")]
    ForeignKey(String),

    /// Password hashing failed while preparing a write
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            let detail = db_err
                .constraint()
                .map(str::to_string)
                .unwrap_or_else(|| db_err.message().to_string());

            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => return StoreError::DuplicateKey(detail),
                Some(NOT_NULL_VIOLATION) => return StoreError::MissingField(detail),
                Some(FOREIGN_KEY_VIOLATION) => return StoreError::ForeignKey(detail),
                _ => {}
            }
        }

        StoreError::Database(err)
    }
}

/// User persistence
///
/// Implementations never hash: they receive and store hashes.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user
    ///
    /// Fails with `DuplicateKey` if the email is taken.
    async fn insert_user(&self, data: CreateUser) -> Result<User, StoreError>;

    /// Finds a user and its hash by exact email
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError>;

    /// Finds a user by ID
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Applies only the `Some` columns of `data`
    ///
    /// Returns `None` when nothing would change or the user does not exist.
    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError>;

    /// All users, newest first
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Hard-deletes a user (and, by cascade, its tasks)
    ///
    /// Returns true if a row was removed.
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Task persistence, always scoped to an owner
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Non-deleted tasks of `owner`, filtered, newest first, paginated
    async fn list_tasks(
        &self,
        owner: Uuid,
        filter: &TaskFilter,
        page: Page,
    ) -> Result<Vec<Task>, StoreError>;

    /// Number of non-deleted tasks of `owner` matching `filter`
    async fn count_tasks(&self, owner: Uuid, filter: &TaskFilter) -> Result<i64, StoreError>;

    /// A single non-deleted task, only if owned by `owner`
    async fn get_task(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, StoreError>;

    /// Creates a task owned by `owner`
    ///
    /// Fails with `ForeignKey` if `owner` does not exist.
    async fn create_task(&self, data: CreateTask, owner: Uuid) -> Result<Task, StoreError>;

    /// Applies only the present fields to a non-deleted task owned by `owner`
    ///
    /// Returns `None` when there is no such task or nothing to change.
    async fn update_task(
        &self,
        id: Uuid,
        owner: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Task>, StoreError>;

    /// Sets the deletion flag on a non-deleted task owned by `owner`
    ///
    /// A second call on the same task returns `None`.
    async fn soft_delete_task(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, StoreError>;

    /// Removes the row outright, deleted or not
    ///
    /// Not routed; soft delete is the only external delete.
    async fn hard_delete_task(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, StoreError>;
}

/// Escapes `%`, `_` and `\` so `search` matches literally inside `ILIKE`
pub fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
