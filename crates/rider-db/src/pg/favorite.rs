//! PostgreSQL favorites repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::FavoriteRow;
use crate::repo::FavoriteRepository;

/// PostgreSQL favorites repository
#[derive(Clone)]
pub struct PgFavoriteRepository {
    pool: PgPool,
}

impl PgFavoriteRepository {
    /// Create a new favorites repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteRepository for PgFavoriteRepository {
    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<FavoriteRow>> {
        let rows = sqlx::query_as::<_, FavoriteRow>(
            r#"
            SELECT id, user_id, name, data, created_at
            FROM favorites
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<FavoriteRow>> {
        let row = sqlx::query_as::<_, FavoriteRow>(
            "SELECT id, user_id, name, data, created_at FROM favorites WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn create(
        &self,
        user_id: Uuid,
        name: &str,
        data: serde_json::Value,
    ) -> DbResult<FavoriteRow> {
        let row = sqlx::query_as::<_, FavoriteRow>(
            r#"
            INSERT INTO favorites (id, user_id, name, data)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, name, data, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .bind(data)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
