/// Projects and their member grants

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::auth::authorization::{check_project_access, AccessLevel, EntityKind};
use crate::models::member::{CreateProjectMember, ProjectMember};
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::store::{ProjectStore, Store, StoreError, UserStore};

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn Store>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Projects the caller owns or is a member of, newest first
    pub async fn list(&self, caller: Uuid) -> ServiceResult<Vec<Project>> {
        Ok(self.store.list_projects_for_user(caller).await?)
    }

    pub async fn create(&self, caller: Uuid, name: String, description: Option<String>) -> ServiceResult<Project> {
        let project = self
            .store
            .insert_project(CreateProject {
                owner_id: caller,
                name,
                description: description.unwrap_or_default(),
            })
            .await?;

        info!(project_id = project.id, owner_id = %caller, "Project created");
        Ok(project)
    }

    pub async fn get(&self, caller: Uuid, id: i64) -> ServiceResult<Project> {
        let access = check_project_access(self.store.as_ref(), caller, id, AccessLevel::MemberOrOwner).await?;
        Ok(access.project)
    }

    /// Owner only; fields left as `None` keep their value
    pub async fn update(&self, caller: Uuid, id: i64, changes: UpdateProject) -> ServiceResult<Project> {
        check_project_access(self.store.as_ref(), caller, id, AccessLevel::Owner).await?;

        self.store
            .update_project(id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Project, id))
    }

    /// Owner only; removes members, tasks and subtasks with the project
    pub async fn delete(&self, caller: Uuid, id: i64) -> ServiceResult<()> {
        check_project_access(self.store.as_ref(), caller, id, AccessLevel::Owner).await?;

        if !self.store.delete_project(id).await? {
            return Err(ServiceError::not_found(EntityKind::Project, id));
        }

        info!(project_id = id, "Project deleted");
        Ok(())
    }

    /// Grants `target` member access to the project
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the caller owns the project
    /// - `NotFound` if the project or `target` does not exist
    /// - `Conflict` if `target` is the owner or already a member
    pub async fn add_member(&self, caller: Uuid, id: i64, target: Uuid) -> ServiceResult<ProjectMember> {
        let access = check_project_access(self.store.as_ref(), caller, id, AccessLevel::Owner).await?;

        if self.store.find_user(target).await?.is_none() {
            return Err(ServiceError::not_found(EntityKind::User, target));
        }
        if access.project.owner_id == target {
            return Err(ServiceError::Conflict("User already owns this project".into()));
        }
        if self.store.find_member(id, target).await?.is_some() {
            return Err(already_member());
        }

        let member = self
            .store
            .insert_member(CreateProjectMember {
                project_id: id,
                user_id: target,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => already_member(),
                other => other.into(),
            })?;

        info!(project_id = id, user_id = %target, "Member added");
        Ok(member)
    }

    pub async fn members(&self, caller: Uuid, id: i64) -> ServiceResult<Vec<ProjectMember>> {
        check_project_access(self.store.as_ref(), caller, id, AccessLevel::MemberOrOwner).await?;
        Ok(self.store.list_members(id).await?)
    }
}

fn already_member() -> ServiceError {
    ServiceError::Conflict("User is already a member of this project".into())
}
