/// Tasks within a project
///
/// Owners edit and delete tasks; any member may list, create and toggle them.
/// [`TaskService::apply_update`] is the single write path for task changes
/// and is also what the cascade engine uses to complete a parent task.

use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::auth::authorization::{check_project_access, check_task_access, AccessLevel, EntityKind};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::work::{WorkFilter, WorkStatus};
use crate::store::{Store, TaskStore};

/// Status a completed task returns to when toggled
pub const TASK_REOPEN_STATUS: WorkStatus = WorkStatus::Todo;

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Tasks of a project, newest first
    pub async fn list(&self, caller: Uuid, project_id: i64, filter: WorkFilter) -> ServiceResult<Vec<Task>> {
        check_project_access(self.store(), caller, project_id, AccessLevel::MemberOrOwner).await?;
        Ok(self.store.list_tasks(project_id, filter).await?)
    }

    /// Creates a task in `data.project_id`
    pub async fn create(&self, caller: Uuid, data: CreateTask) -> ServiceResult<Task> {
        check_project_access(self.store(), caller, data.project_id, AccessLevel::MemberOrOwner).await?;

        let task = self.store.insert_task(data).await?;
        info!(task_id = task.id, project_id = task.project_id, "Task created");
        Ok(task)
    }

    pub async fn get(&self, caller: Uuid, id: i64) -> ServiceResult<Task> {
        Ok(check_task_access(self.store(), caller, id, AccessLevel::MemberOrOwner).await?.task)
    }

    /// Owner only; fields left as `None` keep their value
    pub async fn update(&self, caller: Uuid, id: i64, changes: UpdateTask) -> ServiceResult<Task> {
        self.apply_update(caller, id, changes, AccessLevel::Owner).await
    }

    /// Flips completion: completed goes back to `todo`, anything else completes
    pub async fn toggle_complete(&self, caller: Uuid, id: i64) -> ServiceResult<Task> {
        let access = check_task_access(self.store(), caller, id, AccessLevel::MemberOrOwner).await?;
        let status = access.task.status.toggled(TASK_REOPEN_STATUS);

        debug!(task_id = id, from = %access.task.status, to = %status, "Toggling task");
        self.write(id, UpdateTask::status(status)).await
    }

    pub async fn delete(&self, caller: Uuid, id: i64) -> ServiceResult<()> {
        check_task_access(self.store(), caller, id, AccessLevel::Owner).await?;

        if !self.store.delete_task(id).await? {
            return Err(ServiceError::not_found(EntityKind::Task, id));
        }

        info!(task_id = id, "Task deleted");
        Ok(())
    }

    /// Authorizes `caller` at `level` and writes `changes` in one statement
    ///
    /// Shared by [`TaskService::update`] (owner level) and the cascade engine
    /// (member-or-owner level).
    pub async fn apply_update(
        &self,
        caller: Uuid,
        id: i64,
        changes: UpdateTask,
        level: AccessLevel,
    ) -> ServiceResult<Task> {
        check_task_access(self.store(), caller, id, level).await?;
        self.write(id, changes).await
    }

    async fn write(&self, id: i64, changes: UpdateTask) -> ServiceResult<Task> {
        self.store
            .update_task(id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Task, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::{CreateProject, Project};
    use crate::store::memory::MemoryStore;
    use crate::store::ProjectStore;

    async fn project(store: &MemoryStore, owner: Uuid) -> Project {
        store
            .insert_project(CreateProject {
                owner_id: owner,
                name: "Launch".into(),
                description: String::new(),
            })
            .await
            .unwrap()
    }

    fn new_task(project_id: i64, title: &str) -> CreateTask {
        CreateTask {
            project_id,
            title: title.into(),
            description: None,
            status: WorkStatus::Todo,
            priority: None,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_status() {
        let store = Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();
        let project = project(&store, owner).await;
        let tasks = TaskService::new(store);

        let task = tasks.create(owner, new_task(project.id, "Write docs")).await.unwrap();

        let toggled = tasks.toggle_complete(owner, task.id).await.unwrap();
        assert_eq!(toggled.status, WorkStatus::Completed);
        assert!(toggled.is_completed());

        let restored = tasks.toggle_complete(owner, task.id).await.unwrap();
        assert_eq!(restored.status, WorkStatus::Todo);
        assert!(!restored.is_completed());
    }

    #[tokio::test]
    async fn test_in_progress_toggle_reopens_to_todo() {
        let store = Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();
        let project = project(&store, owner).await;
        let tasks = TaskService::new(store);

        let mut data = new_task(project.id, "Review");
        data.status = WorkStatus::InProgress;
        let task = tasks.create(owner, data).await.unwrap();

        tasks.toggle_complete(owner, task.id).await.unwrap();
        let reopened = tasks.toggle_complete(owner, task.id).await.unwrap();
        assert_eq!(reopened.status, TASK_REOPEN_STATUS);
    }

    #[tokio::test]
    async fn test_stranger_cannot_touch_tasks() {
        let store = Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let project = project(&store, owner).await;
        let tasks = TaskService::new(store);
        let task = tasks.create(owner, new_task(project.id, "Secret")).await.unwrap();

        assert!(matches!(
            tasks.get(stranger, task.id).await.unwrap_err(),
            ServiceError::Forbidden(_)
        ));
        assert!(matches!(
            tasks.create(stranger, new_task(project.id, "Sneaky")).await.unwrap_err(),
            ServiceError::Forbidden(_)
        ));
        assert!(matches!(
            tasks.list(stranger, project.id, WorkFilter::default()).await.unwrap_err(),
            ServiceError::Forbidden(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_task_is_not_found_for_everyone() {
        let store = Arc::new(MemoryStore::new());
        let tasks = TaskService::new(store);

        for caller in [Uuid::new_v4(), Uuid::new_v4()] {
            let err = tasks.get(caller, 999).await.unwrap_err();
            assert!(matches!(err, ServiceError::NotFound { kind: EntityKind::Task, .. }));
        }
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let store = Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();
        let project = project(&store, owner).await;
        let tasks = TaskService::new(store);

        let mut data = new_task(project.id, "Draft");
        data.description = Some("first pass".into());
        let task = tasks.create(owner, data).await.unwrap();

        let updated = tasks
            .update(
                owner,
                task.id,
                UpdateTask {
                    title: Some("Final".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.description.as_deref(), Some("first pass"));
        assert_eq!(updated.project_id, project.id);
    }
}
