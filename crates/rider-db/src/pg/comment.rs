//! PostgreSQL comment repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::activity::insert_activity;
use crate::error::DbResult;
use crate::models::CommentRow;
use crate::repo::{CommentRepository, CreateComment, NewActivity, UpdateComment};

/// PostgreSQL comment repository
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    /// Create a new comment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn list_for_rider(&self, rider_id: Uuid) -> DbResult<Vec<CommentRow>> {
        let comments = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, rider_id, user_id, title, content, status, position_xy,
                   created_at, updated_at
            FROM comments
            WHERE rider_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(rider_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<CommentRow>> {
        let comment = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, rider_id, user_id, title, content, status, position_xy,
                   created_at, updated_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn create(&self, comment: CreateComment, activity: NewActivity) -> DbResult<CommentRow> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO comments (id, rider_id, user_id, title, content, status, position_xy)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, rider_id, user_id, title, content, status, position_xy,
                      created_at, updated_at
            "#,
        )
        .bind(comment.id)
        .bind(comment.rider_id)
        .bind(comment.user_id)
        .bind(&comment.title)
        .bind(&comment.content)
        .bind(&comment.status)
        .bind(&comment.position_xy)
        .fetch_one(&mut *tx)
        .await?;

        insert_activity(&mut tx, comment.user_id, &activity).await?;

        tx.commit().await?;

        Ok(row)
    }

    async fn update(&self, id: Uuid, changes: UpdateComment) -> DbResult<Option<CommentRow>> {
        let comment = sqlx::query_as::<_, CommentRow>(
            r#"
            UPDATE comments SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                status = COALESCE($4, status),
                position_xy = COALESCE($5, position_xy),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, rider_id, user_id, title, content, status, position_xy,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(&changes.status)
        .bind(&changes.position_xy)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
