/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and get a token
///
/// Both share the auth rate limit tier. Tokens are stateless; there is no
/// logout or refresh endpoint.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{trimmed, ValidatedJson},
    routes::users::UserResponse,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tasklane_shared::services::auth::{AuthSession, Registration};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name, trimmed before validation
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    /// Email address
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    /// Password
    #[validate(length(min = 8, max = 255, message = "Password must be between 8 and 255 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(length(min = 1, max = 255, message = "Email is required"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, max = 255, message = "Password is required"))]
    pub password: String,
}

/// Register and login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Access token
    pub token: String,

    pub user: UserResponse,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token,
            user: session.user.into(),
        }
    }
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.com",
///   "password": "analytical-engine"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "token": "eyJ...",
///   "user": { "id": "uuid", "name": "Ada Lovelace", "email": "ada@example.com", ... }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already exists
/// - `429 Too Many Requests`: Auth rate limit exceeded
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let session = state
        .services
        .auth
        .register(Registration {
            name: req.name,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// Login endpoint
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Unknown email or wrong password
/// - `429 Too Many Requests`: Auth rate limit exceeded
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let session = state.services.auth.login(&req.email, &req.password).await?;
    Ok(Json(session.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "password123".into(),
        };
        assert!(valid.validate().is_ok());

        let invalid = RegisterRequest {
            name: String::new(),
            email: "not-an-email".into(),
            password: "short".into(),
        };
        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "   ",
            "email": "ada@example.com",
            "password": "password123"
        }))
        .unwrap();
        assert_eq!(req.name, "");
        assert!(req.validate().unwrap_err().field_errors().contains_key("name"));
    }
}
