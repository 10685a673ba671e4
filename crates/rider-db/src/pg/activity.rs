//! PostgreSQL activity log repository implementation

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::ActivityRow;
use crate::repo::{ActivityRepository, NewActivity};

/// PostgreSQL activity log repository
#[derive(Clone)]
pub struct PgActivityRepository {
    pool: PgPool,
}

impl PgActivityRepository {
    /// Create a new activity repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Append an activity entry on an open connection or transaction
pub(crate) async fn insert_activity(
    conn: &mut PgConnection,
    user_id: Uuid,
    activity: &NewActivity,
) -> DbResult<ActivityRow> {
    let row = sqlx::query_as::<_, ActivityRow>(
        r#"
        INSERT INTO user_logs (id, user_id, title, description)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, title, description, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&activity.title)
    .bind(&activity.description)
    .fetch_one(conn)
    .await?;

    Ok(row)
}

#[async_trait]
impl ActivityRepository for PgActivityRepository {
    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<ActivityRow>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT id, user_id, title, description, created_at
            FROM user_logs
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn record(&self, user_id: Uuid, activity: NewActivity) -> DbResult<ActivityRow> {
        let mut conn = self.pool.acquire().await?;
        insert_activity(&mut conn, user_id, &activity).await
    }
}
