/// Subtasks of a task
///
/// Every operation requires member-or-owner access to the parent task's
/// project. Subtasks are always addressed through their task; a subtask id
/// under the wrong task is not found. Each mutation is followed by a
/// best-effort [`reconcile_parent_best_effort`] run, whose result is returned
/// next to the subtask.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::cascade::{reconcile_parent_best_effort, Reconciliation};
use super::error::{ServiceError, ServiceResult};
use super::task::TaskService;
use crate::auth::authorization::{check_scoped_subtask_access, check_task_access, AccessLevel, EntityKind};
use crate::models::subtask::{CreateSubtask, Subtask, UpdateSubtask};
use crate::models::work::{WorkFilter, WorkStatus};
use crate::store::{Store, SubtaskStore, UserStore};

/// Status a completed subtask returns to when toggled
pub const SUBTASK_REOPEN_STATUS: WorkStatus = WorkStatus::InProgress;

/// A mutated subtask and what it did to its parent
#[derive(Debug, Clone)]
pub struct SubtaskOutcome {
    pub subtask: Subtask,
    pub parent: Reconciliation,
}

#[derive(Clone)]
pub struct SubtaskService {
    store: Arc<dyn Store>,
    tasks: TaskService,
}

impl SubtaskService {
    pub fn new(store: Arc<dyn Store>, tasks: TaskService) -> Self {
        Self { store, tasks }
    }

    pub async fn list(&self, caller: Uuid, task_id: i64, filter: WorkFilter) -> ServiceResult<Vec<Subtask>> {
        check_task_access(self.store.as_ref(), caller, task_id, AccessLevel::MemberOrOwner).await?;
        Ok(self.store.list_subtasks(task_id, filter).await?)
    }

    /// Creates a subtask under `data.task_id`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the task or the assignee does not exist
    /// - `Forbidden` if the caller has no access to the task's project
    pub async fn create(&self, caller: Uuid, data: CreateSubtask) -> ServiceResult<SubtaskOutcome> {
        let task_id = data.task_id;
        check_task_access(self.store.as_ref(), caller, task_id, AccessLevel::MemberOrOwner).await?;
        self.ensure_assignee(data.assigned_to).await?;

        let subtask = self.store.insert_subtask(data).await?;
        info!(subtask_id = subtask.id, task_id, "Subtask created");

        let parent = reconcile_parent_best_effort(&self.tasks, task_id, caller).await;
        Ok(SubtaskOutcome { subtask, parent })
    }

    pub async fn get(&self, caller: Uuid, task_id: i64, id: i64) -> ServiceResult<Subtask> {
        let access =
            check_scoped_subtask_access(self.store.as_ref(), caller, task_id, id, AccessLevel::MemberOrOwner).await?;
        Ok(access.subtask)
    }

    /// Applies the provided fields; `None` keeps the current value
    pub async fn update(
        &self,
        caller: Uuid,
        task_id: i64,
        id: i64,
        changes: UpdateSubtask,
    ) -> ServiceResult<SubtaskOutcome> {
        check_scoped_subtask_access(self.store.as_ref(), caller, task_id, id, AccessLevel::MemberOrOwner).await?;
        self.ensure_assignee(changes.assigned_to).await?;

        let subtask = self.write(id, changes).await?;
        let parent = reconcile_parent_best_effort(&self.tasks, task_id, caller).await;
        Ok(SubtaskOutcome { subtask, parent })
    }

    /// Flips completion: completed goes back to `in_progress`, anything else completes
    pub async fn toggle_complete(&self, caller: Uuid, task_id: i64, id: i64) -> ServiceResult<SubtaskOutcome> {
        let access =
            check_scoped_subtask_access(self.store.as_ref(), caller, task_id, id, AccessLevel::MemberOrOwner).await?;
        let status = access.subtask.status.toggled(SUBTASK_REOPEN_STATUS);

        let subtask = self
            .write(
                id,
                UpdateSubtask {
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await?;
        let parent = reconcile_parent_best_effort(&self.tasks, task_id, caller).await;
        Ok(SubtaskOutcome { subtask, parent })
    }

    /// Deletes the subtask; removing the last open one can complete the task
    pub async fn delete(&self, caller: Uuid, task_id: i64, id: i64) -> ServiceResult<Reconciliation> {
        check_scoped_subtask_access(self.store.as_ref(), caller, task_id, id, AccessLevel::MemberOrOwner).await?;

        if !self.store.delete_subtask(id).await? {
            return Err(ServiceError::not_found(EntityKind::Subtask, id));
        }
        info!(subtask_id = id, task_id, "Subtask deleted");

        Ok(reconcile_parent_best_effort(&self.tasks, task_id, caller).await)
    }

    /// Subtasks assigned to `assignee` in projects the caller can see
    pub async fn assigned_to(&self, caller: Uuid, assignee: Uuid) -> ServiceResult<Vec<Subtask>> {
        Ok(self.store.list_assigned_subtasks(assignee, caller).await?)
    }

    async fn ensure_assignee(&self, assignee: Option<Uuid>) -> ServiceResult<()> {
        if let Some(user_id) = assignee {
            if self.store.find_user(user_id).await?.is_none() {
                return Err(ServiceError::not_found(EntityKind::User, user_id));
            }
        }
        Ok(())
    }

    async fn write(&self, id: i64, changes: UpdateSubtask) -> ServiceResult<Subtask> {
        self.store
            .update_subtask(id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Subtask, id))
    }
}
