/// PostgreSQL store
///
/// Every operation is one parameterized statement executed on a connection
/// checked out of the pool for just that statement. Dynamic statements
/// (filters, partial updates) are assembled with `sqlx::QueryBuilder`, which
/// only ever appends fixed column names and binds every value.
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskdesk_shared::models::task::{Page, TaskFilter};
/// use taskdesk_shared::store::{postgres::PgStore, TaskStore};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store = PgStore::new(pool);
///
/// let tasks = store
///     .list_tasks(Uuid::new_v4(), &TaskFilter::default(), Page::default())
///     .await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::{like_pattern, StoreError, TaskStore, UserStore};
use crate::models::task::{CreateTask, Page, Task, TaskChange, TaskFilter, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User, UserCredentials};

const USER_COLUMNS: &str = "id, name, email, role, created_at, updated_at";

const TASK_COLUMNS: &str =
    "id, user_id, title, description, status, due_date, is_deleted, created_at, updated_at";

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an initialized pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Appends the owner scope and listing filters to a `WHERE`
fn push_task_scope(qb: &mut QueryBuilder<'_, Postgres>, owner: Uuid, filter: &TaskFilter) {
    qb.push(" WHERE user_id = ")
        .push_bind(owner)
        .push(" AND is_deleted = FALSE");

    if let Some(status) = &filter.status {
        qb.push(" AND status::text = ").push_bind(status.clone());
    }

    if let Some(search) = &filter.search {
        qb.push(" AND title ILIKE ").push_bind(like_pattern(search));
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_one(&self.pool)
        .await?;

        debug!(user_id = %user.id, "Inserted user");
        Ok(user)
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError> {
        let user = sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError> {
        if data.is_empty() {
            return Ok(None);
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = NOW()");

        if let Some(name) = data.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(email) = data.email {
            qb.push(", email = ").push_bind(email);
        }
        if let Some(password_hash) = data.password_hash {
            qb.push(", password_hash = ").push_bind(password_hash);
        }
        if let Some(role) = data.role {
            qb.push(", role = ").push_bind(role);
        }

        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(USER_COLUMNS);

        let user = qb
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(user_id = %id, rows = result.rows_affected(), "Deleted user");
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list_tasks(
        &self,
        owner: Uuid,
        filter: &TaskFilter,
        page: Page,
    ) -> Result<Vec<Task>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM tasks", TASK_COLUMNS));
        push_task_scope(&mut qb, owner, filter);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let tasks = qb.build_query_as::<Task>().fetch_all(&self.pool).await?;

        Ok(tasks)
    }

    async fn count_tasks(&self, owner: Uuid, filter: &TaskFilter) -> Result<i64, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        push_task_scope(&mut qb, owner, filter);

        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        Ok(count)
    }

    async fn get_task(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {}
            FROM tasks
            WHERE id = $1 AND user_id = $2 AND is_deleted = FALSE
            "#,
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn create_task(&self, data: CreateTask, owner: Uuid) -> Result<Task, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, status, due_date, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.status.unwrap_or_default())
        .bind(data.due_date)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        debug!(task_id = %task.id, user_id = %owner, "Created task");
        Ok(task)
    }

    async fn update_task(
        &self,
        id: Uuid,
        owner: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Task>, StoreError> {
        let changes = data.into_changes();
        if changes.is_empty() {
            return Ok(None);
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE tasks SET ");
        for change in changes {
            qb.push(change.column()).push(" = ");
            match change {
                TaskChange::Title(title) => qb.push_bind(title),
                TaskChange::Description(description) => qb.push_bind(description),
                TaskChange::Status(status) => qb.push_bind(status),
                TaskChange::DueDate(due_date) => qb.push_bind(due_date),
            };
            qb.push(", ");
        }

        qb.push("updated_at = NOW() WHERE id = ")
            .push_bind(id)
            .push(" AND user_id = ")
            .push_bind(owner)
            .push(" AND is_deleted = FALSE RETURNING ")
            .push(TASK_COLUMNS);

        let task = qb
            .build_query_as::<Task>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn soft_delete_task(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET is_deleted = TRUE, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND is_deleted = FALSE
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn hard_delete_task(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, StoreError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "DELETE FROM tasks WHERE id = $1 AND user_id = $2 RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }
}
