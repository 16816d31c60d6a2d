/// Project endpoints
///
/// # Endpoints
///
/// - `GET    /v1/projects` - Projects owned by or shared with the caller
/// - `POST   /v1/projects` - Create a project owned by the caller
/// - `GET    /v1/projects/:project_id` - Member or owner
/// - `PUT    /v1/projects/:project_id` - Owner only
/// - `DELETE /v1/projects/:project_id` - Owner only, removes tasks and subtasks
/// - `GET    /v1/projects/:project_id/members` - Member or owner
/// - `POST   /v1/projects/:project_id/members` - Owner only

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiPath, ValidatedJson},
    routes::MessageResponse,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use tasklane_shared::auth::identity::AuthContext;
use tasklane_shared::models::member::ProjectMember;
use tasklane_shared::models::project::{Project, UpdateProject};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    #[validate(length(max = 255, message = "Description must be at most 255 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 255, message = "Description must be at most 255 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
}

pub async fn list(State(state): State<AppState>, Extension(auth): Extension<AuthContext>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.services.projects.list(auth.user_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = state
        .services
        .projects
        .create(auth.user_id, req.name, req.description)
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(project_id): ApiPath<i64>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.services.projects.get(auth.user_id, project_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(project_id): ApiPath<i64>,
    ValidatedJson(req): ValidatedJson<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    let project = state
        .services
        .projects
        .update(
            auth.user_id,
            project_id,
            UpdateProject {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok(Json(project))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(project_id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.services.projects.delete(auth.user_id, project_id).await?;
    Ok(Json(MessageResponse::new("Project deleted successfully")))
}

pub async fn members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(project_id): ApiPath<i64>,
) -> ApiResult<Json<Vec<ProjectMember>>> {
    Ok(Json(state.services.projects.members(auth.user_id, project_id).await?))
}

/// Grants a user member access
///
/// # Errors
///
/// - `403 Forbidden`: Caller does not own the project
/// - `404 Not Found`: Project or user does not exist
/// - `409 Conflict`: User is the owner or already a member
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(project_id): ApiPath<i64>,
    ValidatedJson(req): ValidatedJson<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    state
        .services
        .projects
        .add_member(auth.user_id, project_id, req.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::new("user added to project"))))
}
