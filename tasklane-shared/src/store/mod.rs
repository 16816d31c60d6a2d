/// Persistence gateway
///
/// Services and the authorization engine only talk to storage through the
/// traits in this module. Two implementations exist:
///
/// - [`postgres::PgStore`]: production store backed by `sqlx` and the model
///   queries in [`crate::models`]
/// - [`memory::MemoryStore`]: in-process store used by tests and local demos
///
/// Lookups by primary key return `Ok(None)` when the row is absent so that
/// "not found" is never confused with a storage failure.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tasklane_shared::store::{memory::MemoryStore, ProjectStore, Store};
///
/// # async fn example() -> Result<(), tasklane_shared::store::StoreError> {
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
/// assert!(store.find_project(42).await?.is_none());
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    member::{CreateProjectMember, ProjectMember},
    project::{CreateProject, Project, UpdateProject},
    subtask::{CreateSubtask, Subtask, UpdateSubtask},
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, UpdateUser, User},
    work::{WorkFilter, WorkStatus},
};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failures
///
/// Absence of a record is not an error; see the module docs.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

/// PostgreSQL SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return StoreError::Conflict(constraint);
            }
        }
        StoreError::Database(err)
    }
}

/// User records
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>>;
}

/// Project and membership records
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn insert_project(&self, data: CreateProject) -> StoreResult<Project>;
    async fn find_project(&self, id: i64) -> StoreResult<Option<Project>>;

    /// Projects owned by, or shared with, `user_id`; newest first
    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>>;

    async fn update_project(&self, id: i64, data: UpdateProject) -> StoreResult<Option<Project>>;

    /// Deletes the project with its members, tasks and subtasks
    async fn delete_project(&self, id: i64) -> StoreResult<bool>;

    async fn insert_member(&self, data: CreateProjectMember) -> StoreResult<ProjectMember>;
    async fn find_member(&self, project_id: i64, user_id: Uuid) -> StoreResult<Option<ProjectMember>>;
    async fn list_members(&self, project_id: i64) -> StoreResult<Vec<ProjectMember>>;
}

/// Task records
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task>;
    async fn find_task(&self, id: i64) -> StoreResult<Option<Task>>;
    async fn list_tasks(&self, project_id: i64, filter: WorkFilter) -> StoreResult<Vec<Task>>;
    async fn update_task(&self, id: i64, data: UpdateTask) -> StoreResult<Option<Task>>;

    /// Deletes the task with its subtasks
    async fn delete_task(&self, id: i64) -> StoreResult<bool>;
}

/// Subtask records
#[async_trait]
pub trait SubtaskStore: Send + Sync {
    async fn insert_subtask(&self, data: CreateSubtask) -> StoreResult<Subtask>;
    async fn find_subtask(&self, id: i64) -> StoreResult<Option<Subtask>>;
    async fn list_subtasks(&self, task_id: i64, filter: WorkFilter) -> StoreResult<Vec<Subtask>>;

    /// Subtasks assigned to `assignee` in projects visible to `viewer`
    async fn list_assigned_subtasks(&self, assignee: Uuid, viewer: Uuid) -> StoreResult<Vec<Subtask>>;

    /// Number of subtasks under `task_id`, optionally only those in `status`
    async fn count_subtasks(&self, task_id: i64, status: Option<WorkStatus>) -> StoreResult<u64>;

    async fn update_subtask(&self, id: i64, data: UpdateSubtask) -> StoreResult<Option<Subtask>>;
    async fn delete_subtask(&self, id: i64) -> StoreResult<bool>;
}

/// The complete persistence gateway
#[async_trait]
pub trait Store: UserStore + ProjectStore + TaskStore + SubtaskStore {
    /// Verifies the backing store is reachable
    async fn health_check(&self) -> StoreResult<()>;

    /// Short backend name for health reporting
    fn backend(&self) -> &'static str;
}
