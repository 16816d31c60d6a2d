/// Subtask model and database operations
///
/// Subtasks hang off a single task and may be assigned to a user. Their
/// completion feeds the parent task's auto-completion rule, so the count
/// queries here are kept cheap (indexed on `(task_id, status)`).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subtasks (
///     id BIGSERIAL PRIMARY KEY,
///     task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status work_status NOT NULL DEFAULT 'todo',
///     priority work_priority,
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::work::{Priority, WorkFilter, WorkStatus};

const SUBTASK_COLUMNS: &str = "id, task_id, assigned_to, title, description, status, priority, \
                               due_date, created_at, updated_at";

/// A child work item of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subtask {
    pub id: i64,

    /// Parent task; immutable
    pub task_id: i64,

    pub assigned_to: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: WorkStatus,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subtask {
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }
}

/// Input for creating a subtask
#[derive(Debug, Clone)]
pub struct CreateSubtask {
    pub task_id: i64,
    pub assigned_to: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: WorkStatus,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Subtask changes; only `Some` fields are written
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSubtask {
    pub assigned_to: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
}

impl Subtask {
    /// Creates a new subtask
    pub async fn create(pool: &PgPool, data: CreateSubtask) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO subtasks (task_id, assigned_to, title, description, status, priority, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SUBTASK_COLUMNS
        );

        sqlx::query_as::<_, Subtask>(&query)
            .bind(data.task_id)
            .bind(data.assigned_to)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.due_date)
            .fetch_one(pool)
            .await
    }

    /// Finds a subtask by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM subtasks WHERE id = $1", SUBTASK_COLUMNS);

        sqlx::query_as::<_, Subtask>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a task's subtasks matching `filter`, newest first
    pub async fn list_by_task(
        pool: &PgPool,
        task_id: i64,
        filter: WorkFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {}
            FROM subtasks
            WHERE task_id = $1
              AND ($2::work_status IS NULL OR status = $2)
              AND ($3::work_priority IS NULL OR priority = $3)
            ORDER BY created_at DESC, id DESC
            "#,
            SUBTASK_COLUMNS
        );

        sqlx::query_as::<_, Subtask>(&query)
            .bind(task_id)
            .bind(filter.status)
            .bind(filter.priority)
            .fetch_all(pool)
            .await
    }

    /// Lists subtasks assigned to `assignee` inside projects `viewer` can see
    ///
    /// A project is visible when the viewer owns it or holds a membership.
    pub async fn list_assigned(
        pool: &PgPool,
        assignee: Uuid,
        viewer: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subtask>(
            r#"
            SELECT s.id, s.task_id, s.assigned_to, s.title, s.description, s.status,
                   s.priority, s.due_date, s.created_at, s.updated_at
            FROM subtasks s
            JOIN tasks t ON t.id = s.task_id
            JOIN projects p ON p.id = t.project_id
            WHERE s.assigned_to = $1
              AND (
                  p.owner_id = $2
                  OR EXISTS (
                      SELECT 1 FROM project_members m
                      WHERE m.project_id = p.id AND m.user_id = $2
                  )
              )
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )
        .bind(assignee)
        .bind(viewer)
        .fetch_all(pool)
        .await
    }

    /// Counts a task's subtasks, optionally only those in `status`
    pub async fn count_by_task(
        pool: &PgPool,
        task_id: i64,
        status: Option<WorkStatus>,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM subtasks
            WHERE task_id = $1
              AND ($2::work_status IS NULL OR status = $2)
            "#,
        )
        .bind(task_id)
        .bind(status)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Applies `data` in a single statement and bumps `updated_at`
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateSubtask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE subtasks
            SET assigned_to = COALESCE($2, assigned_to),
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                priority = COALESCE($6, priority),
                due_date = COALESCE($7, due_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SUBTASK_COLUMNS
        );

        sqlx::query_as::<_, Subtask>(&query)
            .bind(id)
            .bind(data.assigned_to)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.due_date)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a subtask
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM subtasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
