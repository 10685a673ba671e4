//! PostgreSQL rider repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::activity::insert_activity;
use crate::error::DbResult;
use crate::models::RiderRow;
use crate::repo::{CreateRider, NewActivity, RiderRepository, UpdateRider};

/// PostgreSQL rider repository
#[derive(Clone)]
pub struct PgRiderRepository {
    pool: PgPool,
}

impl PgRiderRepository {
    /// Create a new rider repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RiderRepository for PgRiderRepository {
    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        project_id: Option<Uuid>,
    ) -> DbResult<Vec<RiderRow>> {
        let riders = sqlx::query_as::<_, RiderRow>(
            r#"
            SELECT id, owner_id, project_id, name, description, data, created_at, updated_at
            FROM riders
            WHERE owner_id = $1 AND ($2::uuid IS NULL OR project_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(riders)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<RiderRow>> {
        let rider = sqlx::query_as::<_, RiderRow>(
            r#"
            SELECT id, owner_id, project_id, name, description, data, created_at, updated_at
            FROM riders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rider)
    }

    async fn create_within_quota(
        &self,
        rider: CreateRider,
        allow: &(dyn Fn(i64) -> bool + Send + Sync),
    ) -> DbResult<Option<RiderRow>> {
        let mut tx = self.pool.begin().await?;

        // Lock the owner so concurrent creates for the same user count serially
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(rider.owner_id)
            .execute(&mut *tx)
            .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM riders WHERE owner_id = $1")
            .bind(rider.owner_id)
            .fetch_one(&mut *tx)
            .await?;

        if !allow(count) {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, RiderRow>(
            r#"
            INSERT INTO riders (id, owner_id, project_id, name, description, data)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, owner_id, project_id, name, description, data, created_at, updated_at
            "#,
        )
        .bind(rider.id)
        .bind(rider.owner_id)
        .bind(rider.project_id)
        .bind(&rider.name)
        .bind(&rider.description)
        .bind(&rider.data)
        .fetch_one(&mut *tx)
        .await?;

        insert_activity(&mut tx, rider.owner_id, &rider.activity).await?;

        tx.commit().await?;

        Ok(Some(row))
    }

    async fn update(
        &self,
        id: Uuid,
        changes: UpdateRider,
        activity: NewActivity,
    ) -> DbResult<Option<RiderRow>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, RiderRow>(
            r#"
            UPDATE riders SET
                name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                data = CASE WHEN $5 THEN $6 ELSE data END,
                project_id = CASE WHEN $7 THEN $8 ELSE project_id END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, project_id, name, description, data, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(changes.description.is_some())
        .bind(changes.description.clone().flatten())
        .bind(changes.data.is_some())
        .bind(changes.data.clone().flatten())
        .bind(changes.project_id.is_some())
        .bind(changes.project_id.flatten())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        insert_activity(&mut tx, changes.actor_id, &activity).await?;

        tx.commit().await?;

        Ok(Some(row))
    }

    async fn delete(&self, id: Uuid, actor_id: Uuid, activity: NewActivity) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM riders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Ok(false);
        }

        insert_activity(&mut tx, actor_id, &activity).await?;

        tx.commit().await?;

        Ok(true)
    }
}
