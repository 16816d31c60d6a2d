/// Parent task completion
///
/// After any subtask mutation the parent task is re-evaluated: once every
/// subtask is completed the task is completed too. The rule only ever moves a
/// task forward. A task is never reopened here, even when a new incomplete
/// subtask appears or a subtask is toggled back.
///
/// # Algorithm
///
/// 1. Count all subtasks of the task; none means nothing to do
/// 2. Count the completed ones
/// 3. Equal counts on an incomplete task: write `completed` through
///    [`TaskService::apply_update`] at [`AccessLevel::MemberOrOwner`]
///
/// The counts and the write are separate statements. Two subtasks completed
/// at the same moment can both observe the final count; the second write is
/// then a no-op on an already completed task.

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::task::TaskService;
use crate::auth::authorization::{AccessLevel, EntityKind};
use crate::models::task::{Task, UpdateTask};
use crate::models::work::WorkStatus;
use crate::store::{SubtaskStore, TaskStore};

/// Why a reconciliation run was abandoned
///
/// Only the category leaves this module; the underlying error is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The acting user may not write the task
    Forbidden,

    /// The task vanished between the subtask write and the check
    NotFound,

    /// Storage or any other unexpected failure
    Upstream,
}

impl From<&ServiceError> for SkipReason {
    fn from(err: &ServiceError) -> Self {
        match err {
            ServiceError::Forbidden(_) => SkipReason::Forbidden,
            ServiceError::NotFound { .. } => SkipReason::NotFound,
            ServiceError::Conflict(_) | ServiceError::InvalidCredentials | ServiceError::Upstream(_) => {
                SkipReason::Upstream
            }
        }
    }
}

/// What happened to the parent task after a subtask mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The task has no subtasks
    NoSubtasks,

    /// Some subtasks are still open
    Pending { completed: u64, total: u64 },

    /// Every subtask is done and the task already was
    AlreadyCompleted,

    /// This call completed the task
    Completed { task: Task },

    /// Reconciliation failed; the subtask change itself stands
    Skipped { reason: SkipReason },
}

impl Reconciliation {
    pub fn completed_parent(&self) -> bool {
        matches!(self, Reconciliation::Completed { .. })
    }
}

/// Re-evaluates `task_id` on behalf of `acting_user`
pub async fn reconcile_parent(tasks: &TaskService, task_id: i64, acting_user: Uuid) -> ServiceResult<Reconciliation> {
    let store = tasks.store();

    let total = store.count_subtasks(task_id, None).await?;
    if total == 0 {
        return Ok(Reconciliation::NoSubtasks);
    }

    let completed = store.count_subtasks(task_id, Some(WorkStatus::Completed)).await?;
    if completed < total {
        debug!(task_id, completed, total, "Parent task still pending");
        return Ok(Reconciliation::Pending { completed, total });
    }

    let parent = store
        .find_task(task_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::Task, task_id))?;
    if parent.is_completed() {
        return Ok(Reconciliation::AlreadyCompleted);
    }

    let task = tasks
        .apply_update(
            acting_user,
            task_id,
            UpdateTask::status(WorkStatus::Completed),
            AccessLevel::MemberOrOwner,
        )
        .await?;

    info!(task_id, acting_user = %acting_user, total, "Parent task completed by its subtasks");
    Ok(Reconciliation::Completed { task })
}

/// [`reconcile_parent`] that never fails
///
/// Errors are logged and reported as [`Reconciliation::Skipped`].
pub async fn reconcile_parent_best_effort(tasks: &TaskService, task_id: i64, acting_user: Uuid) -> Reconciliation {
    match reconcile_parent(tasks, task_id, acting_user).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(task_id, acting_user = %acting_user, error = %e, "Parent task reconciliation failed");
            Reconciliation::Skipped { reason: SkipReason::from(&e) }
        }
    }
}
