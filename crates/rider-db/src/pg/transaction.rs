//! PostgreSQL transaction repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use rider_types::TransactionStatus;

use crate::error::DbResult;
use crate::models::TransactionRow;
use crate::repo::TransactionRepository;

/// PostgreSQL transaction repository
#[derive(Clone)]
pub struct PgTransactionRepository {
    pool: PgPool,
}

impl PgTransactionRepository {
    /// Create a new transaction repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn create_pending(
        &self,
        subscription_id: Uuid,
        transaction_code: &str,
    ) -> DbResult<TransactionRow> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            WITH inserted AS (
                INSERT INTO transactions (id, subscription_id, amount_cents, status, transaction_code)
                VALUES ($1, $2, 0, $3, $4)
                RETURNING *
            )
            SELECT i.id, i.subscription_id, s.user_id, i.amount_cents, i.status,
                   i.transaction_code, i.invoice_url, i.transaction_date
            FROM inserted i
            JOIN subscriptions s ON s.id = i.subscription_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(subscription_id)
        .bind(TransactionStatus::Pending.as_str())
        .bind(transaction_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<TransactionRow>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT t.id, t.subscription_id, s.user_id, t.amount_cents, t.status,
                   t.transaction_code, t.invoice_url, t.transaction_date
            FROM transactions t
            JOIN subscriptions s ON s.id = t.subscription_id
            WHERE s.user_id = $1
            ORDER BY t.transaction_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TransactionRow>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT t.id, t.subscription_id, s.user_id, t.amount_cents, t.status,
                   t.transaction_code, t.invoice_url, t.transaction_date
            FROM transactions t
            JOIN subscriptions s ON s.id = t.subscription_id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
