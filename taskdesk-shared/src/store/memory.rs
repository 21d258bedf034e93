/// In-memory store
///
/// Implements [`UserStore`] and [`TaskStore`] over two `RwLock`-guarded maps
/// with the same observable rules as the PostgreSQL schema:
///
/// - email uniqueness (`DuplicateKey`)
/// - tasks must reference an existing user (`ForeignKey`)
/// - deleting a user cascades to its tasks
/// - every task read/write is scoped by owner and skips soft-deleted rows
///
/// Used by the API test-suite and for running the server without a database.
///
/// # Example
///
/// ```
/// use taskdesk_shared::models::task::CreateTask;
/// use taskdesk_shared::models::user::{CreateUser, Role};
/// use taskdesk_shared::store::{memory::MemoryStore, TaskStore, UserStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let user = store.insert_user(CreateUser {
///     name: "Ada".to_string(),
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: Role::User,
/// }).await?;
///
/// let task = store.create_task(CreateTask { title: "t1".to_string(), ..Default::default() }, user.id).await?;
/// assert!(store.get_task(task.id, user.id).await?.is_some());
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{StoreError, TaskStore, UserStore};
use crate::models::task::{CreateTask, Page, Task, TaskFilter, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User, UserCredentials};

/// Store keeping everything in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, UserCredentials>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
    clock: Mutex<Option<DateTime<Utc>>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time, strictly increasing across calls
    ///
    /// Keeps newest-first ordering stable when rows are created within the
    /// same clock tick.
    async fn now(&self) -> DateTime<Utc> {
        let mut last = self.clock.lock().await;
        let mut now = Utc::now();
        if let Some(prev) = *last {
            if now <= prev {
                now = prev + Duration::microseconds(1);
            }
        }
        *last = Some(now);
        now
    }

    fn email_taken(users: &HashMap<Uuid, UserCredentials>, email: &str, except: Option<Uuid>) -> bool {
        users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn owned_live_tasks<'a>(
        tasks: &'a HashMap<Uuid, Task>,
        owner: Uuid,
        filter: &'a TaskFilter,
    ) -> impl Iterator<Item = &'a Task> + 'a {
        tasks
            .values()
            .filter(move |t| t.user_id == owner && !t.is_deleted && filter.matches(t))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let now = self.now().await;
        let mut users = self.users.write().await;

        if Self::email_taken(&users, &data.email, None) {
            return Err(StoreError::DuplicateKey("users_email_key".to_string()));
        }

        let record = UserCredentials {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            role: data.role,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id, record.clone());

        Ok(record.into_user())
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned().map(UserCredentials::into_user))
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError> {
        if data.is_empty() {
            return Ok(None);
        }

        let now = self.now().await;
        let mut users = self.users.write().await;

        if let Some(email) = &data.email {
            if Self::email_taken(&users, email, Some(id)) {
                return Err(StoreError::DuplicateKey("users_email_key".to_string()));
            }
        }

        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            user.name = name;
        }
        if let Some(email) = data.email {
            user.email = email;
        }
        if let Some(password_hash) = data.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = data.role {
            user.role = role;
        }
        user.updated_at = now;

        Ok(Some(user.clone().into_user()))
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut list: Vec<User> = users.values().cloned().map(UserCredentials::into_user).collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        if users.remove(&id).is_none() {
            return Ok(false);
        }

        // Lock order is users then tasks, as in create_task
        self.tasks.write().await.retain(|_, t| t.user_id != id);
        Ok(true)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(
        &self,
        owner: Uuid,
        filter: &TaskFilter,
        page: Page,
    ) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;

        let mut matching: Vec<&Task> = Self::owned_live_tasks(&tasks, owner, filter).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let offset = usize::try_from(page.offset.max(0)).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit.max(0)).unwrap_or(usize::MAX);

        Ok(matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_tasks(&self, owner: Uuid, filter: &TaskFilter) -> Result<i64, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(Self::owned_live_tasks(&tasks, owner, filter).count() as i64)
    }

    async fn get_task(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .get(&id)
            .filter(|t| t.user_id == owner && !t.is_deleted)
            .cloned())
    }

    async fn create_task(&self, data: CreateTask, owner: Uuid) -> Result<Task, StoreError> {
        // Held until the insert lands so a concurrent delete_user cascades over it
        let users = self.users.read().await;
        if !users.contains_key(&owner) {
            return Err(StoreError::ForeignKey("tasks_user_id_fkey".to_string()));
        }

        let now = self.now().await;
        let task = Task {
            id: Uuid::new_v4(),
            user_id: owner,
            title: data.title,
            description: data.description,
            status: data.status.unwrap_or_default(),
            due_date: data.due_date,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        self.tasks.write().await.insert(task.id, task.clone());
        drop(users);
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

        let now = self.now().await;
        let mut tasks = self.tasks.write().await;

        let Some(task) = tasks
            .get_mut(&id)
            .filter(|t| t.user_id == owner && !t.is_deleted)
        else {
            return Ok(None);
        };

        for change in changes {
            change.apply(task);
        }
        task.updated_at = now;

        Ok(Some(task.clone()))
    }

    async fn soft_delete_task(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, StoreError> {
        let now = self.now().await;
        let mut tasks = self.tasks.write().await;

        let Some(task) = tasks
            .get_mut(&id)
            .filter(|t| t.user_id == owner && !t.is_deleted)
        else {
            return Ok(None);
        };

        task.is_deleted = true;
        task.updated_at = now;

        Ok(Some(task.clone()))
    }

    async fn hard_delete_task(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, StoreError> {
        let mut tasks = self.tasks.write().await;

        if tasks.get(&id).map_or(false, |t| t.user_id == owner) {
            return Ok(tasks.remove(&id));
        }

        Ok(None)
    }
}
