/// Project membership grants
///
/// A membership row gives a non-owner user MEMBER-level access to one
/// project. The pair `(project_id, user_id)` is unique.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_members (
///     id BIGSERIAL PRIMARY KEY,
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT project_members_project_user_key UNIQUE (project_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A user's membership in a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub id: i64,
    pub project_id: i64,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Input for granting membership
#[derive(Debug, Clone, Copy)]
pub struct CreateProjectMember {
    pub project_id: i64,
    pub user_id: Uuid,
}

impl ProjectMember {
    /// Grants membership
    ///
    /// # Errors
    ///
    /// Fails with a unique violation if the user is already a member.
    pub async fn create(pool: &PgPool, data: CreateProjectMember) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_members (project_id, user_id)
            VALUES ($1, $2)
            RETURNING id, project_id, user_id, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.user_id)
        .fetch_one(pool)
        .await
    }

    /// Finds the membership of `user_id` in `project_id`, if any
    pub async fn find(
        pool: &PgPool,
        project_id: i64,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT id, project_id, user_id, created_at
            FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists members of a project in the order they were added
    pub async fn list_by_project(pool: &PgPool, project_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT id, project_id, user_id, created_at
            FROM project_members
            WHERE project_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}
