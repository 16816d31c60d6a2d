/// The caller's own profile

use std::sync::Arc;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::auth::authorization::EntityKind;
use crate::models::user::{normalize_email, UpdateUser, User};
use crate::store::{Store, StoreError, UserStore};

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn profile(&self, caller: Uuid) -> ServiceResult<User> {
        self.store
            .find_user(caller)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::User, caller))
    }

    /// Applies the provided fields to the caller's profile
    ///
    /// # Errors
    ///
    /// - `Conflict` if `email` belongs to another user
    /// - `NotFound` if the caller no longer exists
    pub async fn update_profile(&self, caller: Uuid, changes: UpdateUser) -> ServiceResult<User> {
        let email = changes.email.as_deref().map(normalize_email);

        if let Some(email) = &email {
            if let Some(holder) = self.store.find_user_by_email(email).await? {
                if holder.id != caller {
                    return Err(ServiceError::Conflict("Email already registered".into()));
                }
            }
        }

        let changes = UpdateUser {
            name: changes.name.map(|name| name.trim().to_string()),
            email,
        };

        self.store
            .update_user(caller, changes)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => ServiceError::Conflict("Email already registered".into()),
                other => other.into(),
            })?
            .ok_or_else(|| ServiceError::not_found(EntityKind::User, caller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::CreateUser;
    use crate::store::memory::MemoryStore;

    async fn seed(store: &MemoryStore, email: &str) -> User {
        store
            .insert_user(CreateUser {
                name: "Someone".into(),
                email: email.into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_update_profile_changes_only_given_fields() {
        let store = Arc::new(MemoryStore::new());
        let user = seed(&store, "ada@example.com").await;
        let users = UserService::new(store);

        let updated = users
            .update_profile(
                user.id,
                UpdateUser {
                    name: Some("Ada Lovelace".into()),
                    email: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Ada Lovelace");
        assert_eq!(updated.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_update_profile_email_taken() {
        let store = Arc::new(MemoryStore::new());
        let ada = seed(&store, "ada@example.com").await;
        seed(&store, "bob@example.com").await;
        let users = UserService::new(store);

        let err = users
            .update_profile(
                ada.id,
                UpdateUser {
                    name: None,
                    email: Some("BOB@example.com".into()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        // Re-submitting one's own address is fine
        let same = users
            .update_profile(
                ada.id,
                UpdateUser {
                    name: None,
                    email: Some("ada@example.com".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(same.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_profile_of_unknown_user() {
        let users = UserService::new(Arc::new(MemoryStore::new()));
        let err = users.profile(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { kind: EntityKind::User, .. }));
    }
}
