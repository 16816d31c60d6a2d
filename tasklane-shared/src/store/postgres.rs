/// PostgreSQL implementation of the persistence gateway
///
/// Thin adapter over the model functions; every mutation is a single SQL
/// statement so individual writes are atomic.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ProjectStore, Store, StoreResult, SubtaskStore, TaskStore, UserStore};
use crate::db::pool::health_check;
use crate::models::{
    member::{CreateProjectMember, ProjectMember},
    project::{CreateProject, Project, UpdateProject},
    subtask::{CreateSubtask, Subtask, UpdateSubtask},
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, UpdateUser, User},
    work::{WorkFilter, WorkStatus},
};

/// Store backed by a `sqlx` connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for migrations and shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        Ok(User::update(&self.pool, id, data).await?)
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn insert_project(&self, data: CreateProject) -> StoreResult<Project> {
        Ok(Project::create(&self.pool, data).await?)
    }

    async fn find_project(&self, id: i64) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        Ok(Project::list_for_user(&self.pool, user_id).await?)
    }

    async fn update_project(&self, id: i64, data: UpdateProject) -> StoreResult<Option<Project>> {
        Ok(Project::update(&self.pool, id, data).await?)
    }

    async fn delete_project(&self, id: i64) -> StoreResult<bool> {
        Ok(Project::delete(&self.pool, id).await?)
    }

    async fn insert_member(&self, data: CreateProjectMember) -> StoreResult<ProjectMember> {
        Ok(ProjectMember::create(&self.pool, data).await?)
    }

    async fn find_member(&self, project_id: i64, user_id: Uuid) -> StoreResult<Option<ProjectMember>> {
        Ok(ProjectMember::find(&self.pool, project_id, user_id).await?)
    }

    async fn list_members(&self, project_id: i64) -> StoreResult<Vec<ProjectMember>> {
        Ok(ProjectMember::list_by_project(&self.pool, project_id).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn find_task(&self, id: i64) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_tasks(&self, project_id: i64, filter: WorkFilter) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_project(&self.pool, project_id, filter).await?)
    }

    async fn update_task(&self, id: i64, data: UpdateTask) -> StoreResult<Option<Task>> {
        Ok(Task::update(&self.pool, id, data).await?)
    }

    async fn delete_task(&self, id: i64) -> StoreResult<bool> {
        Ok(Task::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl SubtaskStore for PgStore {
    async fn insert_subtask(&self, data: CreateSubtask) -> StoreResult<Subtask> {
        Ok(Subtask::create(&self.pool, data).await?)
    }

    async fn find_subtask(&self, id: i64) -> StoreResult<Option<Subtask>> {
        Ok(Subtask::find_by_id(&self.pool, id).await?)
    }

    async fn list_subtasks(&self, task_id: i64, filter: WorkFilter) -> StoreResult<Vec<Subtask>> {
        Ok(Subtask::list_by_task(&self.pool, task_id, filter).await?)
    }

    async fn list_assigned_subtasks(&self, assignee: Uuid, viewer: Uuid) -> StoreResult<Vec<Subtask>> {
        Ok(Subtask::list_assigned(&self.pool, assignee, viewer).await?)
    }

    async fn count_subtasks(&self, task_id: i64, status: Option<WorkStatus>) -> StoreResult<u64> {
        let count = Subtask::count_by_task(&self.pool, task_id, status).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn update_subtask(&self, id: i64, data: UpdateSubtask) -> StoreResult<Option<Subtask>> {
        Ok(Subtask::update(&self.pool, id, data).await?)
    }

    async fn delete_subtask(&self, id: i64) -> StoreResult<bool> {
        Ok(Subtask::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
