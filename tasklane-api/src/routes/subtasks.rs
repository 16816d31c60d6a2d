/// Subtask endpoints
///
/// # Endpoints
///
/// - `GET    /v1/subtasks?assigned_to=` - Subtasks assigned to a user (default: caller)
/// - `GET    /v1/tasks/:task_id/subtasks?status=&priority=`
/// - `POST   /v1/tasks/:task_id/subtasks`
/// - `GET    /v1/tasks/:task_id/subtasks/:subtask_id`
/// - `PUT    /v1/tasks/:task_id/subtasks/:subtask_id`
/// - `DELETE /v1/tasks/:task_id/subtasks/:subtask_id`
/// - `PATCH  /v1/tasks/:task_id/subtasks/:subtask_id/complete`
///
/// All of them need member or owner access to the task's project. Mutations
/// report what happened to the parent task under `parent`:
///
/// ```json
/// {
///   "subtask": { "id": 3, "status": "completed", "completed": true, ... },
///   "parent": { "outcome": "completed", "task": { "id": 1, "completed": true, ... } }
/// }
/// ```
///
/// Other outcomes are `no_subtasks`, `pending` (with `completed` and `total`
/// counts), `already_completed` and `skipped` (with a `reason` of
/// `forbidden`, `not_found` or `upstream`).

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiPath, ApiQuery, ValidatedJson},
    routes::tasks::TaskResponse,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasklane_shared::auth::identity::AuthContext;
use tasklane_shared::models::subtask::{CreateSubtask, Subtask, UpdateSubtask};
use tasklane_shared::models::work::{Priority, WorkFilter, WorkStatus};
use tasklane_shared::services::cascade::{Reconciliation, SkipReason};
use tasklane_shared::services::subtask::SubtaskOutcome;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct SubtaskResponse {
    pub id: i64,
    pub task_id: i64,
    pub assigned_to: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: WorkStatus,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Subtask> for SubtaskResponse {
    fn from(subtask: Subtask) -> Self {
        Self {
            completed: subtask.is_completed(),
            id: subtask.id,
            task_id: subtask.task_id,
            assigned_to: subtask.assigned_to,
            title: subtask.title,
            description: subtask.description,
            status: subtask.status,
            priority: subtask.priority,
            due_date: subtask.due_date,
            created_at: subtask.created_at,
            updated_at: subtask.updated_at,
        }
    }
}

/// What a subtask mutation did to its parent task
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ParentResponse {
    NoSubtasks,
    Pending { completed: u64, total: u64 },
    AlreadyCompleted,
    Completed { task: TaskResponse },
    Skipped { reason: SkipReason },
}

impl From<Reconciliation> for ParentResponse {
    fn from(reconciliation: Reconciliation) -> Self {
        match reconciliation {
            Reconciliation::NoSubtasks => ParentResponse::NoSubtasks,
            Reconciliation::Pending { completed, total } => ParentResponse::Pending { completed, total },
            Reconciliation::AlreadyCompleted => ParentResponse::AlreadyCompleted,
            Reconciliation::Completed { task } => ParentResponse::Completed { task: task.into() },
            Reconciliation::Skipped { reason } => ParentResponse::Skipped { reason },
        }
    }
}

/// A mutated subtask with the parent task's reconciliation result
#[derive(Debug, Serialize)]
pub struct SubtaskOutcomeResponse {
    pub subtask: SubtaskResponse,
    pub parent: ParentResponse,
}

impl From<SubtaskOutcome> for SubtaskOutcomeResponse {
    fn from(outcome: SubtaskOutcome) -> Self {
        Self {
            subtask: outcome.subtask.into(),
            parent: outcome.parent.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubtaskDeletedResponse {
    pub message: String,
    pub parent: ParentResponse,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubtaskRequest {
    #[validate(length(min = 2, max = 255, message = "Title must be between 2 and 255 characters"))]
    pub title: String,

    pub description: Option<String>,

    /// Defaults to `todo`
    pub status: Option<WorkStatus>,

    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,

    /// Must reference an existing user
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSubtaskRequest {
    #[validate(length(min = 2, max = 255, message = "Title must be between 2 and 255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,
    pub status: Option<WorkStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AssignedQuery {
    pub assigned_to: Option<Uuid>,
}

fn responses(subtasks: Vec<Subtask>) -> Vec<SubtaskResponse> {
    subtasks.into_iter().map(SubtaskResponse::from).collect()
}

/// Subtasks assigned to `assigned_to`, limited to projects the caller can see
pub async fn assigned(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<AssignedQuery>,
) -> ApiResult<Json<Vec<SubtaskResponse>>> {
    let assignee = query.assigned_to.unwrap_or(auth.user_id);
    let subtasks = state.services.subtasks.assigned_to(auth.user_id, assignee).await?;
    Ok(Json(responses(subtasks)))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<i64>,
    ApiQuery(filter): ApiQuery<WorkFilter>,
) -> ApiResult<Json<Vec<SubtaskResponse>>> {
    let subtasks = state.services.subtasks.list(auth.user_id, task_id, filter).await?;
    Ok(Json(responses(subtasks)))
}

/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `403 Forbidden`: No access to the task's project
/// - `404 Not Found`: Task or assignee does not exist
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<i64>,
    ValidatedJson(req): ValidatedJson<CreateSubtaskRequest>,
) -> ApiResult<(StatusCode, Json<SubtaskOutcomeResponse>)> {
    let outcome = state
        .services
        .subtasks
        .create(
            auth.user_id,
            CreateSubtask {
                task_id,
                assigned_to: req.assigned_to,
                title: req.title,
                description: req.description,
                status: req.status.unwrap_or(WorkStatus::Todo),
                priority: req.priority,
                due_date: req.due_date,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(outcome.into())))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath((task_id, subtask_id)): ApiPath<(i64, i64)>,
) -> ApiResult<Json<SubtaskResponse>> {
    let subtask = state.services.subtasks.get(auth.user_id, task_id, subtask_id).await?;
    Ok(Json(subtask.into()))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath((task_id, subtask_id)): ApiPath<(i64, i64)>,
    ValidatedJson(req): ValidatedJson<UpdateSubtaskRequest>,
) -> ApiResult<Json<SubtaskOutcomeResponse>> {
    let outcome = state
        .services
        .subtasks
        .update(
            auth.user_id,
            task_id,
            subtask_id,
            UpdateSubtask {
                assigned_to: req.assigned_to,
                title: req.title,
                description: req.description,
                status: req.status,
                priority: req.priority,
                due_date: req.due_date,
            },
        )
        .await?;

    Ok(Json(outcome.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath((task_id, subtask_id)): ApiPath<(i64, i64)>,
) -> ApiResult<Json<SubtaskDeletedResponse>> {
    let parent = state.services.subtasks.delete(auth.user_id, task_id, subtask_id).await?;

    Ok(Json(SubtaskDeletedResponse {
        message: "Subtask deleted successfully".to_string(),
        parent: parent.into(),
    }))
}

/// Completed subtasks go back to `in_progress`; anything else completes
pub async fn toggle_complete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath((task_id, subtask_id)): ApiPath<(i64, i64)>,
) -> ApiResult<Json<SubtaskOutcomeResponse>> {
    let outcome = state
        .services
        .subtasks
        .toggle_complete(auth.user_id, task_id, subtask_id)
        .await?;

    Ok(Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tasklane_shared::models::task::Task;

    #[test]
    fn test_completed_parent_carries_completed_flag() {
        let now = Utc::now();
        let parent = ParentResponse::from(Reconciliation::Completed {
            task: Task {
                id: 4,
                project_id: 1,
                title: "Ship".into(),
                description: None,
                status: WorkStatus::Completed,
                priority: None,
                due_date: None,
                created_at: now,
                updated_at: now,
            },
        });

        let body = serde_json::to_value(&parent).unwrap();
        assert_eq!(body["outcome"], "completed");
        assert_eq!(body["task"]["id"], 4);
        assert_eq!(body["task"]["completed"], true);
    }

    #[test]
    fn test_skipped_parent_exposes_only_reason_code() {
        let parent = ParentResponse::from(Reconciliation::Skipped {
            reason: SkipReason::Upstream,
        });
        assert_eq!(
            serde_json::to_value(&parent).unwrap(),
            json!({ "outcome": "skipped", "reason": "upstream" })
        );

        let pending = ParentResponse::from(Reconciliation::Pending { completed: 1, total: 3 });
        assert_eq!(
            serde_json::to_value(&pending).unwrap(),
            json!({ "outcome": "pending", "completed": 1, "total": 3 })
        );
    }
}
