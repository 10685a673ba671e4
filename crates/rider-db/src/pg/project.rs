//! PostgreSQL project repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::ProjectRow;
use crate::repo::ProjectRepository;

/// PostgreSQL project repository
#[derive(Clone)]
pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    /// Create a new project repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn list_by_owner(&self, user_id: Uuid) -> DbResult<Vec<ProjectRow>> {
        let projects = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT id, user_id, name, created_at, updated_at
            FROM projects
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ProjectRow>> {
        let project = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, user_id, name, created_at, updated_at FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn create(&self, user_id: Uuid, name: &str) -> DbResult<ProjectRow> {
        let project = sqlx::query_as::<_, ProjectRow>(
            r#"
            INSERT INTO projects (id, user_id, name)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(project)
    }

    async fn rename(&self, id: Uuid, name: &str) -> DbResult<Option<ProjectRow>> {
        let project = sqlx::query_as::<_, ProjectRow>(
            r#"
            UPDATE projects SET name = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, user_id, name, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn delete(&self, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
