/// Request identity
///
/// Turns an `Authorization` header value into an [`AuthContext`]. The HTTP
/// layer runs this in middleware and stores the context in request
/// extensions, where handlers pick it up with `Extension<AuthContext>`.
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use tasklane_shared::auth::identity::authenticate;
/// use tasklane_shared::auth::jwt::{create_token, Claims};
/// use uuid::Uuid;
///
/// let secret = "a-secret-of-at-least-thirty-two-bytes!";
/// let user_id = Uuid::new_v4();
/// let token = create_token(&Claims::new(user_id, Duration::hours(1)), secret).unwrap();
///
/// let header = format!("Bearer {}", token);
/// let auth = authenticate(Some(&header), secret).unwrap();
/// assert_eq!(auth.user_id, user_id);
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};

/// The authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
}

/// Authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    #[error("Expected Bearer token")]
    InvalidFormat,

    #[error(transparent)]
    InvalidToken(#[from] JwtError),
}

/// Extracts the token from a `Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;
    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidFormat)?;

    if token.is_empty() {
        return Err(AuthError::InvalidFormat);
    }
    Ok(token)
}

/// Validates a bearer header and returns the caller identity
pub fn authenticate(header: Option<&str>, secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(header)?;
    let claims = validate_token(token, secret)?;

    Ok(AuthContext {
        user_id: claims.sub,
    })
}
