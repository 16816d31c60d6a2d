/// Ownership-based authorization
///
/// Every task and subtask is authorized through the project it belongs to.
///
/// # Permission Model
///
/// 1. **Owner**: the single user recorded as `projects.owner_id`
/// 2. **Member**: a user with a `project_members` row for the project
///
/// Two access levels are checked:
///
/// - [`AccessLevel::Owner`]: project update/delete/member-add, task update/delete
/// - [`AccessLevel::MemberOrOwner`]: everything else (reads, task create and
///   toggle, every subtask operation)
///
/// Ownership always satisfies `MemberOrOwner`; membership never satisfies
/// `Owner`.
///
/// # Resolution Order
///
/// The target is loaded first: a missing entity (or a missing parent) is
/// reported as [`AuthzError::NotFound`] before any permission is evaluated.
/// Storage failures surface as [`AuthzError::Upstream`] and are never turned
/// into a denial.
///
/// # Example
///
/// ```no_run
/// use tasklane_shared::auth::authorization::{check_task_access, AccessLevel};
/// use tasklane_shared::store::Store;
/// use uuid::Uuid;
///
/// # async fn example(store: &dyn Store, caller: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let access = check_task_access(store, caller, 42, AccessLevel::Owner).await?;
/// println!("{} may edit task {}", caller, access.task.id);
/// # Ok(())
/// # }
/// ```

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::models::{project::Project, subtask::Subtask, task::Task};
use crate::store::{ProjectStore, Store, StoreError, SubtaskStore, TaskStore};

/// Access level required by an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Caller must own the project
    Owner,

    /// Caller must own the project or be one of its members
    MemberOrOwner,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::Owner => f.write_str("owner"),
            AccessLevel::MemberOrOwner => f.write_str("member or owner"),
        }
    }
}

/// The caller's relationship to a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    Owner,
    Member,
}

impl ProjectRole {
    /// Whether this role is enough for `level`
    pub fn satisfies(self, level: AccessLevel) -> bool {
        match (self, level) {
            (ProjectRole::Owner, _) => true,
            (ProjectRole::Member, AccessLevel::MemberOrOwner) => true,
            (ProjectRole::Member, AccessLevel::Owner) => false,
        }
    }
}

/// Kinds of entity that can be looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Project,
    Task,
    Subtask,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::User => "user",
            EntityKind::Project => "project",
            EntityKind::Task => "task",
            EntityKind::Subtask => "subtask",
        })
    }
}

/// An authorization target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Project(i64),
    Task(i64),
    Subtask(i64),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Project(_) => EntityKind::Project,
            EntityRef::Task(_) => EntityKind::Task,
            EntityRef::Subtask(_) => EntityKind::Subtask,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            EntityRef::Project(id) | EntityRef::Task(id) | EntityRef::Subtask(id) => *id,
        }
    }
}

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Target (or one of its parents) does not exist
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    /// Target exists but the caller lacks the required level
    #[error("{level} access to {kind} {id} required")]
    Forbidden {
        kind: EntityKind,
        id: i64,
        level: AccessLevel,
    },

    /// Storage failed while resolving the target
    #[error("Authorization lookup failed: {0}")]
    Upstream(#[from] StoreError),
}

impl AuthzError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        AuthzError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Granted access to a project
#[derive(Debug, Clone)]
pub struct ProjectAccess {
    pub project: Project,
    pub role: ProjectRole,
}

/// Granted access to a task, with its resolved project
#[derive(Debug, Clone)]
pub struct TaskAccess {
    pub task: Task,
    pub project: Project,
    pub role: ProjectRole,
}

/// Granted access to a subtask, with its resolved task and project
#[derive(Debug, Clone)]
pub struct SubtaskAccess {
    pub subtask: Subtask,
    pub task: Task,
    pub project: Project,
    pub role: ProjectRole,
}

/// Determines the caller's role in `project`, if any
///
/// The membership table is only consulted when the caller is not the owner.
pub async fn resolve_role(
    store: &dyn Store,
    caller: Uuid,
    project: &Project,
) -> Result<Option<ProjectRole>, StoreError> {
    if project.owner_id == caller {
        return Ok(Some(ProjectRole::Owner));
    }

    let membership = store.find_member(project.id, caller).await?;
    Ok(membership.map(|_| ProjectRole::Member))
}

/// Applies `level` to an already-resolved role
pub fn authorize(
    role: Option<ProjectRole>,
    level: AccessLevel,
    target: EntityRef,
) -> Result<ProjectRole, AuthzError> {
    match role {
        Some(role) if role.satisfies(level) => Ok(role),
        _ => Err(AuthzError::Forbidden {
            kind: target.kind(),
            id: target.id(),
            level,
        }),
    }
}

async fn load_project(store: &dyn Store, project_id: i64) -> Result<Project, AuthzError> {
    store
        .find_project(project_id)
        .await?
        .ok_or_else(|| AuthzError::not_found(EntityKind::Project, project_id))
}

async fn load_task(store: &dyn Store, task_id: i64) -> Result<Task, AuthzError> {
    store
        .find_task(task_id)
        .await?
        .ok_or_else(|| AuthzError::not_found(EntityKind::Task, task_id))
}

/// Checks `caller` against a project
pub async fn check_project_access(
    store: &dyn Store,
    caller: Uuid,
    project_id: i64,
    level: AccessLevel,
) -> Result<ProjectAccess, AuthzError> {
    let project = load_project(store, project_id).await?;
    let role = resolve_role(store, caller, &project).await?;
    let role = authorize(role, level, EntityRef::Project(project_id))?;

    Ok(ProjectAccess { project, role })
}

/// Checks `caller` against a task by walking up to its project
pub async fn check_task_access(
    store: &dyn Store,
    caller: Uuid,
    task_id: i64,
    level: AccessLevel,
) -> Result<TaskAccess, AuthzError> {
    let task = load_task(store, task_id).await?;
    let project = load_project(store, task.project_id).await?;
    let role = resolve_role(store, caller, &project).await?;
    let role = authorize(role, level, EntityRef::Task(task_id))?;

    Ok(TaskAccess {
        task,
        project,
        role,
    })
}

/// Checks `caller` against a subtask by walking up through its task
pub async fn check_subtask_access(
    store: &dyn Store,
    caller: Uuid,
    subtask_id: i64,
    level: AccessLevel,
) -> Result<SubtaskAccess, AuthzError> {
    let subtask = store
        .find_subtask(subtask_id)
        .await?
        .ok_or_else(|| AuthzError::not_found(EntityKind::Subtask, subtask_id))?;
    let task = load_task(store, subtask.task_id).await?;
    let project = load_project(store, task.project_id).await?;
    let role = resolve_role(store, caller, &project).await?;
    let role = authorize(role, level, EntityRef::Subtask(subtask_id))?;

    Ok(SubtaskAccess {
        subtask,
        task,
        project,
        role,
    })
}

/// Checks `caller` against a subtask addressed through its parent task
///
/// A subtask that exists under a different task is reported as not found, so
/// `/tasks/{a}/subtasks/{b}` never reaches a subtask of another task.
pub async fn check_scoped_subtask_access(
    store: &dyn Store,
    caller: Uuid,
    task_id: i64,
    subtask_id: i64,
    level: AccessLevel,
) -> Result<SubtaskAccess, AuthzError> {
    let subtask = store
        .find_subtask(subtask_id)
        .await?
        .filter(|subtask| subtask.task_id == task_id)
        .ok_or_else(|| AuthzError::not_found(EntityKind::Subtask, subtask_id))?;
    let task = load_task(store, task_id).await?;
    let project = load_project(store, task.project_id).await?;
    let role = resolve_role(store, caller, &project).await?;
    let role = authorize(role, level, EntityRef::Subtask(subtask_id))?;

    Ok(SubtaskAccess {
        subtask,
        task,
        project,
        role,
    })
}

/// Checks `caller` against any entity and returns the granted role
pub async fn check_access(
    store: &dyn Store,
    caller: Uuid,
    target: EntityRef,
    level: AccessLevel,
) -> Result<ProjectRole, AuthzError> {
    match target {
        EntityRef::Project(id) => Ok(check_project_access(store, caller, id, level).await?.role),
        EntityRef::Task(id) => Ok(check_task_access(store, caller, id, level).await?.role),
        EntityRef::Subtask(id) => Ok(check_subtask_access(store, caller, id, level).await?.role),
    }
}
