/// Entity services
///
/// Each service sequences the authorization engine, the store and (for
/// subtasks) the cascade engine for one entity type. None of them hold state
/// beyond a shared handle to the [`Store`], so they are cheap to clone.
///
/// # Example
///
/// ```no_run
/// use chrono::Duration;
/// use std::sync::Arc;
/// use tasklane_shared::services::{auth::Registration, Services};
/// use tasklane_shared::store::memory::MemoryStore;
///
/// # async fn example() -> Result<(), tasklane_shared::services::ServiceError> {
/// let services = Services::new(
///     Arc::new(MemoryStore::new()),
///     "a-secret-of-at-least-thirty-two-bytes!",
///     Duration::hours(24),
/// );
///
/// let session = services
///     .auth
///     .register(Registration {
///         name: "Ada".into(),
///         email: "ada@example.com".into(),
///         password: "password123".into(),
///     })
///     .await?;
/// let project = services.projects.create(session.user.id, "Launch".into(), None).await?;
/// # Ok(())
/// # }
/// ```

pub mod auth;
pub mod cascade;
pub mod error;
pub mod project;
pub mod subtask;
pub mod task;
pub mod user;

pub use error::{ServiceError, ServiceResult};

use chrono::Duration;
use std::sync::Arc;

use crate::store::Store;

/// All entity services over one store
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub users: user::UserService,
    pub projects: project::ProjectService,
    pub tasks: task::TaskService,
    pub subtasks: subtask::SubtaskService,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, jwt_secret: &str, token_ttl: Duration) -> Self {
        let tasks = task::TaskService::new(store.clone());

        Self {
            auth: auth::AuthService::new(store.clone(), jwt_secret, token_ttl),
            users: user::UserService::new(store.clone()),
            projects: project::ProjectService::new(store.clone()),
            subtasks: subtask::SubtaskService::new(store, tasks.clone()),
            tasks,
        }
    }
}
