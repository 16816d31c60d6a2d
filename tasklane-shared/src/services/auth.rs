/// Registration and login
///
/// Argon2id hashing is CPU-bound, so both operations run it on the blocking
/// thread pool instead of the async executor.

use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{ServiceError, ServiceResult};
use crate::auth::jwt::{create_token, Claims};
use crate::auth::password::{hash_password, verify_password};
use crate::models::user::{normalize_email, CreateUser, User};
use crate::store::{Store, StoreError, UserStore};

/// Input for [`AuthService::register`]
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// An issued access token together with its user
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    jwt_secret: Arc<str>,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, jwt_secret: impl Into<Arc<str>>, token_ttl: Duration) -> Self {
        Self {
            store,
            jwt_secret: jwt_secret.into(),
            token_ttl,
        }
    }

    /// Creates an account and signs the user in
    ///
    /// # Errors
    ///
    /// - `Conflict` if the (normalized) email is already registered
    /// - `Upstream` if hashing, storage or signing fails
    pub async fn register(&self, input: Registration) -> ServiceResult<AuthSession> {
        let email = normalize_email(&input.email);

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict("Email already registered".into()));
        }

        let password = input.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ServiceError::Upstream(format!("Password hashing task failed: {}", e)))??;

        let user = self
            .store
            .insert_user(CreateUser {
                name: input.name.trim().to_string(),
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration
                StoreError::Conflict(_) => ServiceError::Conflict("Email already registered".into()),
                other => other.into(),
            })?;

        info!(user_id = %user.id, "User registered");
        self.session(user)
    }

    /// Verifies credentials and issues a fresh token
    ///
    /// Unknown email and wrong password both yield
    /// [`ServiceError::InvalidCredentials`].
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<AuthSession> {
        let email = normalize_email(email);

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            debug!("Login for unknown email");
            return Err(ServiceError::InvalidCredentials);
        };

        let hash = user.password_hash.clone();
        let password = password.to_string();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ServiceError::Upstream(format!("Password verification task failed: {}", e)))??;

        if !valid {
            debug!(user_id = %user.id, "Login with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in");
        self.session(user)
    }

    fn session(&self, user: User) -> ServiceResult<AuthSession> {
        let claims = Claims::new(user.id, self.token_ttl);
        let token = create_token(&claims, &self.jwt_secret)?;
        Ok(AuthSession { token, user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::validate_token;
    use crate::store::memory::MemoryStore;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryStore::new()), SECRET, Duration::hours(1))
    }

    fn registration(email: &str) -> Registration {
        Registration {
            name: "Ada".into(),
            email: email.into(),
            password: "password123".into(),
        }
    }

    #[tokio::test]
    async fn test_register_issues_valid_token() {
        let auth = service();
        let session = auth.register(registration("Ada@Example.com ")).await.unwrap();

        assert_eq!(session.user.email, "ada@example.com");
        assert_ne!(session.user.password_hash, "password123");
        let claims = validate_token(&session.token, SECRET).unwrap();
        assert_eq!(claims.sub, session.user.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let auth = service();
        auth.register(registration("ada@example.com")).await.unwrap();

        let err = auth.register(registration("ADA@example.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let auth = service();
        auth.register(registration("ada@example.com")).await.unwrap();

        let wrong_password = auth.login("ada@example.com", "nope").await.unwrap_err();
        let unknown_email = auth.login("bob@example.com", "password123").await.unwrap_err();

        assert!(matches!(wrong_password, ServiceError::InvalidCredentials));
        assert!(matches!(unknown_email, ServiceError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_login_succeeds_with_registered_credentials() {
        let auth = service();
        let registered = auth.register(registration("ada@example.com")).await.unwrap();

        let session = auth.login("ada@example.com", "password123").await.unwrap();
        assert_eq!(session.user.id, registered.user.id);
    }
}
