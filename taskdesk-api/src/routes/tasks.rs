/// Task endpoints
///
/// Every handler scopes by the authenticated user. A task owned by someone
/// else behaves exactly like a task that does not exist.
///
/// # Endpoints
///
/// - `GET /api/tasks?status=&search=&limit=&offset=` - List own tasks
/// - `POST /api/tasks` - Create a task
/// - `GET /api/tasks/:id` - Get one task
/// - `PUT /api/tasks/:id` - Partial update
/// - `DELETE /api/tasks/:id` - Soft delete

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Extension,
};
use serde::Deserialize;
use taskdesk_shared::auth::middleware::AuthContext;
use taskdesk_shared::models::task::{CreateTask, Page, Task, TaskFilter, TaskStatus, UpdateTask};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{Envelope, Pagination},
    validation::{
        at_least_one, filled, iso_date, not_empty, nullable, one_of, parse_iso_date, Patch,
        ValidatedJson,
    },
};

const GET_NOT_FOUND: &str = "Not found Task or you do not have permission";
const UPDATE_NOT_FOUND: &str = "Task not found or you do not have permission to update it";
const DELETE_NOT_FOUND: &str = "Task not found or you do not have permission to delete it";
const STATUS_MESSAGE: &str = "Status must be one of: pending, in_progress, completed";

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(
        required(message = "Title is required"),
        custom(function = "not_empty", message = "Title is required"),
        length(max = 255, message = "Title must not exceed 255 characters")
    )]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description must not exceed 5000 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "known_status"))]
    pub status: Option<String>,

    #[validate(custom(function = "iso_date"))]
    pub due_date: Option<String>,
}

impl CreateTaskRequest {
    /// Converts a validated request into store input
    fn into_create(self) -> CreateTask {
        CreateTask {
            title: self.title.unwrap_or_default(),
            description: self.description.filter(|d| !d.is_empty()),
            status: self.status.and_then(|s| s.parse().ok()),
            due_date: self.due_date.as_deref().and_then(parse_iso_date),
        }
    }
}

/// Partial task update
///
/// Every field tells absent from `null`. `null` clears `description` and
/// `due_date`; it is rejected for `title` and `status`.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "task_has_changes"))]
pub struct UpdateTaskRequest {
    #[serde(default, deserialize_with = "nullable")]
    #[validate(
        custom(function = "filled", message = "Title cannot be empty"),
        length(max = 255, message = "Title must not exceed 255 characters")
    )]
    pub title: Patch<String>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 5000, message = "Description must not exceed 5000 characters"))]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(custom(function = "known_status_change"))]
    pub status: Patch<String>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(custom(function = "iso_date"))]
    pub due_date: Option<Option<String>>,
}

fn task_has_changes(req: &UpdateTaskRequest) -> Result<(), ValidationError> {
    at_least_one(
        req.title.is_some()
            || req.description.is_some()
            || req.status.is_some()
            || req.due_date.is_some(),
    )
}

impl UpdateTaskRequest {
    fn into_update(self) -> UpdateTask {
        UpdateTask {
            title: self.title.flatten(),
            description: self
                .description
                .map(|d| d.filter(|d| !d.is_empty())),
            status: self.status.flatten().and_then(|s| s.parse().ok()),
            due_date: self
                .due_date
                .map(|d| d.as_deref().and_then(parse_iso_date)),
        }
    }
}

fn known_status(status: &str) -> Result<(), ValidationError> {
    one_of(status, &TaskStatus::ALL.map(|s| s.as_str()), STATUS_MESSAGE)
}

fn known_status_change(status: &Patch<String>) -> Result<(), ValidationError> {
    match status {
        Some(Some(status)) => known_status(status),
        Some(None) => known_status(""),
        None => Ok(()),
    }
}

/// Listing query string
///
/// Kept as raw strings: a non-numeric `limit` or `offset` falls back to its
/// default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ListTasksQuery {
    /// Empty `status`/`search` mean no filter
    pub fn filter(&self) -> TaskFilter {
        TaskFilter {
            status: self.status.clone().filter(|s| !s.is_empty()),
            search: self.search.clone().filter(|s| !s.is_empty()),
        }
    }

    /// Limit defaults to 10 (also for zero or negative), offset to 0;
    /// `max_limit` caps the limit when configured.
    pub fn page(&self, max_limit: Option<i64>) -> Page {
        let limit = self
            .limit
            .as_deref()
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l > 0)
            .unwrap_or(Page::DEFAULT_LIMIT);

        let offset = self
            .offset
            .as_deref()
            .and_then(|o| o.trim().parse::<i64>().ok())
            .filter(|o| *o >= 0)
            .unwrap_or(0);

        Page {
            limit: max_limit.map_or(limit, |max| limit.min(max)),
            offset,
        }
    }
}

/// Path ids that are not UUIDs cannot match any task
fn parse_task_id(raw: &str, not_found: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(not_found.to_string()))
}

/// List the caller's tasks
///
/// # Endpoint
///
/// ```text
/// GET /api/tasks?status=pending&search=milk&limit=10&offset=0
/// Authorization: Bearer <token>
/// ```
///
/// # Response (200)
///
/// ```json
/// {
///   "success": true,
///   "count": 1,
///   "data": [{ "id": "uuid", "title": "Buy milk", "status": "pending", ... }],
///   "pagination": { "total": 1, "limit": 10, "offset": 0, "pages": 1 }
/// }
/// ```
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    query: Result<Query<ListTasksQuery>, QueryRejection>,
) -> ApiResult<Envelope<Vec<Task>>> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let filter = query.filter();
    let page = query.page(state.config.tasks.max_page_limit);

    let tasks = state.tasks.list_tasks(auth.id, &filter, page).await?;
    let total = state.tasks.count_tasks(auth.id, &filter).await?;
    let count = tasks.len();

    Ok(Envelope::ok(tasks).with_count(count).with_pagination(Pagination {
        total,
        limit: page.limit,
        offset: page.offset,
        pages: page.page_count(total),
    }))
}

/// Get one of the caller's tasks
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Envelope<Task>> {
    let id = parse_task_id(&id, GET_NOT_FOUND)?;

    let task = state
        .tasks
        .get_task(id, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(GET_NOT_FOUND.to_string()))?;

    Ok(Envelope::ok(task))
}

/// Create a task owned by the caller
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `401 Unauthorized`: missing or invalid token
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<Envelope<Task>> {
    let task = state.tasks.create_task(req.into_create(), auth.id).await?;

    tracing::debug!(task_id = %task.id, user_id = %auth.id, "Task created");

    Ok(Envelope::created(task).with_message("Task created successfully"))
}

/// Apply the present fields to one of the caller's tasks
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> ApiResult<Envelope<Task>> {
    let id = parse_task_id(&id, UPDATE_NOT_FOUND)?;

    let task = state
        .tasks
        .update_task(id, auth.id, req.into_update())
        .await?
        .ok_or_else(|| ApiError::NotFound(UPDATE_NOT_FOUND.to_string()))?;

    Ok(Envelope::ok(task).with_message("Task updated successfully"))
}

/// Soft-delete one of the caller's tasks
///
/// A second delete of the same task is a 404.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Envelope<()>> {
    let id = parse_task_id(&id, DELETE_NOT_FOUND)?;

    let task = state
        .tasks
        .soft_delete_task(id, auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(DELETE_NOT_FOUND.to_string()))?;

    tracing::debug!(task_id = %task.id, user_id = %auth.id, "Task soft-deleted");

    Ok(Envelope::message("Task deleted successfully"))
}
