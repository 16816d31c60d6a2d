/// Task model and database operations
///
/// Tasks belong to one project for their whole lifetime. Completion is derived
/// from [`WorkStatus`]; there is no separate completed column to drift out of
/// sync.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status work_status NOT NULL DEFAULT 'todo',
///     priority work_priority,
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tasklane_shared::models::task::{CreateTask, Task, UpdateTask};
/// use tasklane_shared::models::work::WorkStatus;
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, project_id: i64) -> Result<(), sqlx::Error> {
/// let task = Task::create(
///     &pool,
///     CreateTask {
///         project_id,
///         title: "Write release notes".to_string(),
///         description: None,
///         status: WorkStatus::Todo,
///         priority: None,
///         due_date: None,
///     },
/// )
/// .await?;
///
/// let done = UpdateTask {
///     status: Some(WorkStatus::Completed),
///     ..Default::default()
/// };
/// let task = Task::update(&pool, task.id, done).await?.expect("task exists");
/// assert!(task.is_completed());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::work::{Priority, WorkFilter, WorkStatus};

const TASK_COLUMNS: &str =
    "id, project_id, title, description, status, priority, due_date, created_at, updated_at";

/// A unit of work inside a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,

    /// Owning project; immutable
    pub project_id: i64,

    pub title: String,
    pub description: Option<String>,
    pub status: WorkStatus,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Completion flag exposed in responses
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: WorkStatus,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Task changes; only `Some` fields are written
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
}

impl UpdateTask {
    /// Change set that only moves the task to `status`
    pub fn status(status: WorkStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

impl Task {
    /// Creates a new task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tasks (project_id, title, description, status, priority, due_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.project_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.due_date)
            .fetch_one(pool)
            .await
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a project's tasks matching `filter`, newest first
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: i64,
        filter: WorkFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {}
            FROM tasks
            WHERE project_id = $1
              AND ($2::work_status IS NULL OR status = $2)
              AND ($3::work_priority IS NULL OR priority = $3)
            ORDER BY created_at DESC, id DESC
            "#,
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .bind(filter.status)
            .bind(filter.priority)
            .fetch_all(pool)
            .await
    }

    /// Applies `data` in a single statement and bumps `updated_at`
    ///
    /// Returns `None` if the task does not exist.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                due_date = COALESCE($6, due_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TASK_COLUMNS
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.due_date)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a task and its subtasks
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_is_derived_from_status() {
        let mut task = Task {
            id: 1,
            project_id: 1,
            title: "t".to_string(),
            description: None,
            status: WorkStatus::InProgress,
            priority: Some(Priority::Low),
            due_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!task.is_completed());

        task.status = WorkStatus::Completed;
        assert!(task.is_completed());
    }

    #[test]
    fn test_update_task_status_helper() {
        let update = UpdateTask::status(WorkStatus::Completed);
        assert_eq!(update.status, Some(WorkStatus::Completed));
        assert!(update.title.is_none());
        assert!(update.priority.is_none());
    }
}
