/// The caller's profile
///
/// - `GET /v1/users/me`
/// - `PUT /v1/users/me`

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{trimmed_opt, ValidatedJson},
};
use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasklane_shared::auth::identity::AuthContext;
use tasklane_shared::models::user::{UpdateUser, User};
use uuid::Uuid;
use validator::Validate;

/// Public view of a user; never includes the password hash
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Profile update; omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 2, max = 255, message = "Name must be between 2 and 255 characters"))]
    pub name: Option<String>,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: Option<String>,
}

pub async fn me(State(state): State<AppState>, Extension(auth): Extension<AuthContext>) -> ApiResult<Json<UserResponse>> {
    let user = state.services.users.profile(auth.user_id).await?;
    Ok(Json(user.into()))
}

/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email belongs to another user
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .services
        .users
        .update_profile(
            auth.user_id,
            UpdateUser {
                name: req.name,
                email: req.email,
            },
        )
        .await?;

    Ok(Json(user.into()))
}
