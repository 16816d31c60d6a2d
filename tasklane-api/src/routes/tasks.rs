/// Task endpoints
///
/// # Endpoints
///
/// - `GET    /v1/projects/:project_id/tasks?status=&priority=` - Member or owner
/// - `POST   /v1/projects/:project_id/tasks` - Member or owner
/// - `GET    /v1/tasks/:task_id` - Member or owner
/// - `PUT    /v1/tasks/:task_id` - Owner only
/// - `DELETE /v1/tasks/:task_id` - Owner only
/// - `PATCH  /v1/tasks/:task_id/complete` - Member or owner, toggles completion
///
/// Every task body carries `completed`, derived from `status`.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiPath, ApiQuery, ValidatedJson},
    routes::MessageResponse,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasklane_shared::auth::identity::AuthContext;
use tasklane_shared::models::task::{CreateTask, Task, UpdateTask};
use tasklane_shared::models::work::{Priority, WorkFilter, WorkStatus};
use validator::Validate;

/// Task as returned by the API
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: WorkStatus,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            completed: task.is_completed(),
            id: task.id,
            project_id: task.project_id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 2, max = 255, message = "Title must be between 2 and 255 characters"))]
    pub title: String,

    pub description: Option<String>,

    /// Defaults to `todo`
    pub status: Option<WorkStatus>,

    pub priority: Option<Priority>,

    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 2, max = 255, message = "Title must be between 2 and 255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,
    pub status: Option<WorkStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
}

fn responses(tasks: Vec<Task>) -> Vec<TaskResponse> {
    tasks.into_iter().map(TaskResponse::from).collect()
}

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(project_id): ApiPath<i64>,
    ApiQuery(filter): ApiQuery<WorkFilter>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let tasks = state.services.tasks.list(auth.user_id, project_id, filter).await?;
    Ok(Json(responses(tasks)))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(project_id): ApiPath<i64>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let task = state
        .services
        .tasks
        .create(
            auth.user_id,
            CreateTask {
                project_id,
                title: req.title,
                description: req.description,
                status: req.status.unwrap_or(WorkStatus::Todo),
                priority: req.priority,
                due_date: req.due_date,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(task.into())))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<i64>,
) -> ApiResult<Json<TaskResponse>> {
    Ok(Json(state.services.tasks.get(auth.user_id, task_id).await?.into()))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<i64>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state
        .services
        .tasks
        .update(
            auth.user_id,
            task_id,
            UpdateTask {
                title: req.title,
                description: req.description,
                status: req.status,
                priority: req.priority,
                due_date: req.due_date,
            },
        )
        .await?;

    Ok(Json(task.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.services.tasks.delete(auth.user_id, task_id).await?;
    Ok(Json(MessageResponse::new("Task deleted successfully")))
}

pub async fn toggle_complete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<i64>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state.services.tasks.toggle_complete(auth.user_id, task_id).await?;
    Ok(Json(task.into()))
}
