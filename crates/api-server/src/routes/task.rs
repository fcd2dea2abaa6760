//! Task API endpoints
//!
//! RESTful API for task CRUD operations.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tasklist_core::task::{Task, TaskRepository};
use tasklist_core::Error;

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            completed: task.completed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

type RouteError = (StatusCode, Json<MessageResponse>);

/// Map a store error onto the HTTP status it corresponds to
fn store_error(e: Error) -> RouteError {
    let status = match e {
        Error::TaskNotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(MessageResponse {
            message: e.to_string(),
        }),
    )
}

fn bad_request(message: impl Into<String>) -> RouteError {
    (
        StatusCode::BAD_REQUEST,
        Json(MessageResponse {
            message: message.into(),
        }),
    )
}

fn not_found(id: Uuid) -> RouteError {
    (
        StatusCode::NOT_FOUND,
        Json(MessageResponse {
            message: format!("Task {} not found", id),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/tasks - List all tasks
async fn list_tasks(
    State(state): State<AppState>,
) -> Result<Json<Vec<TaskResponse>>, RouteError> {
    let tasks = state.task_store().list().await.map_err(store_error)?;

    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// POST /api/tasks - Create a new task
async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), RouteError> {
    // Validate input before touching the store
    let title = match req.title {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(bad_request("Title is required")),
    };

    let task = Task::new(title).with_completed(req.completed.unwrap_or(false));

    let created = state.task_store().create(task).await.map_err(store_error)?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from(created))))
}

/// PUT /api/tasks/:id - Update a task
///
/// Fields omitted from the body preserve their existing value.
async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, RouteError> {
    // First get the existing task
    let existing = state.task_store().get(id).await.map_err(store_error)?;

    let mut task = match existing {
        Some(t) => t,
        None => return Err(not_found(id)),
    };

    // Apply updates
    if let Some(title) = req.title {
        if title.trim().is_empty() {
            return Err(bad_request("Title cannot be empty"));
        }
        task.title = title;
    }

    if let Some(completed) = req.completed {
        task.completed = completed;
    }

    let updated = state.task_store().update(task).await.map_err(store_error)?;

    Ok(Json(TaskResponse::from(updated)))
}

/// GET /api/tasks/:id - Get a single task
async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskResponse>, RouteError> {
    let task = state.task_store().get(id).await.map_err(store_error)?;

    match task {
        Some(t) => Ok(Json(TaskResponse::from(t))),
        None => Err(not_found(id)),
    }
}

/// DELETE /api/tasks/:id - Delete a task
async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, RouteError> {
    let deleted = state.task_store().delete(id).await.map_err(store_error)?;

    if deleted {
        Ok(Json(MessageResponse {
            message: "Task deleted".to_string(),
        }))
    } else {
        Err(not_found(id))
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
}
