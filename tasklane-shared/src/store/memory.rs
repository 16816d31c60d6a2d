/// In-process implementation of the persistence gateway
///
/// Mirrors the PostgreSQL schema closely enough for service-level tests:
/// sequences for BIGSERIAL ids, the two unique constraints, cascading deletes,
/// and newest-first ordering on list queries.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProjectStore, Store, StoreError, StoreResult, SubtaskStore, TaskStore, UserStore};
use crate::models::{
    member::{CreateProjectMember, ProjectMember},
    project::{CreateProject, Project, UpdateProject},
    subtask::{CreateSubtask, Subtask, UpdateSubtask},
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, UpdateUser, User},
    work::{WorkFilter, WorkStatus},
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    projects: BTreeMap<i64, Project>,
    members: Vec<ProjectMember>,
    tasks: BTreeMap<i64, Task>,
    subtasks: BTreeMap<i64, Subtask>,
    next_project_id: i64,
    next_member_id: i64,
    next_task_id: i64,
    next_subtask_id: i64,
}

fn next_id(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

impl Tables {
    fn can_view(&self, project_id: i64, viewer: Uuid) -> bool {
        match self.projects.get(&project_id) {
            Some(project) if project.owner_id == viewer => true,
            Some(_) => self
                .members
                .iter()
                .any(|m| m.project_id == project_id && m.user_id == viewer),
            None => false,
        }
    }

    fn remove_task_cascade(&mut self, task_id: i64) -> bool {
        let removed = self.tasks.remove(&task_id).is_some();
        if removed {
            self.subtasks.retain(|_, s| s.task_id != task_id);
        }
        removed
    }
}

/// Newest first, ties broken by id
fn newest_first<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> (chrono::DateTime<Utc>, i64),
{
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

/// Store that keeps every table in memory behind a single lock
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == data.email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &data.email {
            if tables.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Conflict("users_email_key".to_string()));
            }
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = data.name {
            user.name = name;
        }
        if let Some(email) = data.email {
            user.email = email;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn insert_project(&self, data: CreateProject) -> StoreResult<Project> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let project = Project {
            id: next_id(&mut tables.next_project_id),
            owner_id: data.owner_id,
            name: data.name,
            description: data.description,
            created_at: now,
            updated_at: now,
        };
        tables.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_project(&self, id: i64) -> StoreResult<Option<Project>> {
        Ok(self.tables.read().await.projects.get(&id).cloned())
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables
            .projects
            .values()
            .filter(|p| tables.can_view(p.id, user_id))
            .cloned()
            .collect();
        newest_first(&mut projects, |p| (p.created_at, p.id));
        Ok(projects)
    }

    async fn update_project(&self, id: i64, data: UpdateProject) -> StoreResult<Option<Project>> {
        let mut tables = self.tables.write().await;
        let Some(project) = tables.projects.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = data.name {
            project.name = name;
        }
        if let Some(description) = data.description {
            project.description = description;
        }
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.projects.remove(&id).is_none() {
            return Ok(false);
        }

        tables.members.retain(|m| m.project_id != id);
        let task_ids: Vec<i64> = tables
            .tasks
            .values()
            .filter(|t| t.project_id == id)
            .map(|t| t.id)
            .collect();
        for task_id in task_ids {
            tables.remove_task_cascade(task_id);
        }
        Ok(true)
    }

    async fn insert_member(&self, data: CreateProjectMember) -> StoreResult<ProjectMember> {
        let mut tables = self.tables.write().await;
        if tables
            .members
            .iter()
            .any(|m| m.project_id == data.project_id && m.user_id == data.user_id)
        {
            return Err(StoreError::Conflict(
                "project_members_project_user_key".to_string(),
            ));
        }

        let member = ProjectMember {
            id: next_id(&mut tables.next_member_id),
            project_id: data.project_id,
            user_id: data.user_id,
            created_at: Utc::now(),
        };
        tables.members.push(member.clone());
        Ok(member)
    }

    async fn find_member(&self, project_id: i64, user_id: Uuid) -> StoreResult<Option<ProjectMember>> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_members(&self, project_id: i64) -> StoreResult<Vec<ProjectMember>> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let task = Task {
            id: next_id(&mut tables.next_task_id),
            project_id: data.project_id,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            due_date: data.due_date,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: i64) -> StoreResult<Option<Task>> {
        Ok(self.tables.read().await.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self, project_id: i64, filter: WorkFilter) -> StoreResult<Vec<Task>> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .values()
            .filter(|t| t.project_id == project_id && filter.matches(t.status, t.priority))
            .cloned()
            .collect();
        newest_first(&mut tasks, |t| (t.created_at, t.id));
        Ok(tasks)
    }

    async fn update_task(&self, id: i64, data: UpdateTask) -> StoreResult<Option<Task>> {
        let mut tables = self.tables.write().await;
        let Some(task) = tables.tasks.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = data.title {
            task.title = title;
        }
        if let Some(description) = data.description {
            task.description = Some(description);
        }
        if let Some(status) = data.status {
            task.status = status;
        }
        if let Some(priority) = data.priority {
            task.priority = Some(priority);
        }
        if let Some(due_date) = data.due_date {
            task.due_date = Some(due_date);
        }
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.write().await.remove_task_cascade(id))
    }
}

#[async_trait]
impl SubtaskStore for MemoryStore {
    async fn insert_subtask(&self, data: CreateSubtask) -> StoreResult<Subtask> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let subtask = Subtask {
            id: next_id(&mut tables.next_subtask_id),
            task_id: data.task_id,
            assigned_to: data.assigned_to,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            due_date: data.due_date,
            created_at: now,
            updated_at: now,
        };
        tables.subtasks.insert(subtask.id, subtask.clone());
        Ok(subtask)
    }

    async fn find_subtask(&self, id: i64) -> StoreResult<Option<Subtask>> {
        Ok(self.tables.read().await.subtasks.get(&id).cloned())
    }

    async fn list_subtasks(&self, task_id: i64, filter: WorkFilter) -> StoreResult<Vec<Subtask>> {
        let tables = self.tables.read().await;
        let mut subtasks: Vec<Subtask> = tables
            .subtasks
            .values()
            .filter(|s| s.task_id == task_id && filter.matches(s.status, s.priority))
            .cloned()
            .collect();
        newest_first(&mut subtasks, |s| (s.created_at, s.id));
        Ok(subtasks)
    }

    async fn list_assigned_subtasks(&self, assignee: Uuid, viewer: Uuid) -> StoreResult<Vec<Subtask>> {
        let tables = self.tables.read().await;
        let mut subtasks: Vec<Subtask> = tables
            .subtasks
            .values()
            .filter(|s| s.assigned_to == Some(assignee))
            .filter(|s| {
                tables
                    .tasks
                    .get(&s.task_id)
                    .map_or(false, |t| tables.can_view(t.project_id, viewer))
            })
            .cloned()
            .collect();
        newest_first(&mut subtasks, |s| (s.created_at, s.id));
        Ok(subtasks)
    }

    async fn count_subtasks(&self, task_id: i64, status: Option<WorkStatus>) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        let count = tables
            .subtasks
            .values()
            .filter(|s| s.task_id == task_id)
            .filter(|s| status.map_or(true, |wanted| s.status == wanted))
            .count();
        Ok(count as u64)
    }

    async fn update_subtask(&self, id: i64, data: UpdateSubtask) -> StoreResult<Option<Subtask>> {
        let mut tables = self.tables.write().await;
        let Some(subtask) = tables.subtasks.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(assignee) = data.assigned_to {
            subtask.assigned_to = Some(assignee);
        }
        if let Some(title) = data.title {
            subtask.title = title;
        }
        if let Some(description) = data.description {
            subtask.description = Some(description);
        }
        if let Some(status) = data.status {
            subtask.status = status;
        }
        if let Some(priority) = data.priority {
            subtask.priority = Some(priority);
        }
        if let Some(due_date) = data.due_date {
            subtask.due_date = Some(due_date);
        }
        subtask.updated_at = Utc::now();
        Ok(Some(subtask.clone()))
    }

    async fn delete_subtask(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.write().await.subtasks.remove(&id).is_some())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
