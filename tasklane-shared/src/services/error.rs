/// Service error taxonomy
///
/// Every entity service returns [`ServiceResult`]. The HTTP layer maps each
/// variant to exactly one status code, so no caller ever inspects message
/// text.

use crate::auth::authorization::{AuthzError, EntityKind};
use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    /// Unknown email or wrong password; the two are not distinguished
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Storage, hashing or token signing failed
    #[error("{0}")]
    Upstream(String),
}

impl ServiceError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        ServiceError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotFound { kind, id } => ServiceError::NotFound { kind, id },
            forbidden @ AuthzError::Forbidden { .. } => ServiceError::Forbidden(forbidden.to_string()),
            AuthzError::Upstream(store) => store.into(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) => {
                ServiceError::Conflict(format!("Record already exists ({})", constraint))
            }
            StoreError::Database(e) => ServiceError::Upstream(format!("Database error: {}", e)),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Upstream(err.to_string())
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        ServiceError::Upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authorization::AccessLevel;

    #[test]
    fn test_authz_not_found_keeps_kind() {
        let err: ServiceError = AuthzError::not_found(EntityKind::Task, 7).into();
        match err {
            ServiceError::NotFound { kind, id } => {
                assert_eq!(kind, EntityKind::Task);
                assert_eq!(id, "7");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_authz_forbidden_message() {
        let err: ServiceError = AuthzError::Forbidden {
            kind: EntityKind::Project,
            id: 3,
            level: AccessLevel::Owner,
        }
        .into();
        assert!(matches!(err, ServiceError::Forbidden(ref msg) if msg == "owner access to project 3 required"));
    }

    #[test]
    fn test_store_conflict_maps_to_conflict() {
        let err: ServiceError = StoreError::Conflict("users_email_key".into()).into();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err: ServiceError = AuthzError::Upstream(StoreError::Database(sqlx::Error::PoolTimedOut)).into();
        assert!(matches!(err, ServiceError::Upstream(_)));
    }
}
