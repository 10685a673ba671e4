//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use rider_types::{SubscriptionStatus, TransactionStatus};

use super::activity::insert_activity;
use crate::error::DbResult;
use crate::models::{CurrentSubscriptionRow, SubscriptionRow};
use crate::repo::{
    CheckoutActivation, CheckoutOutcome, InvoiceEvent, SubscriptionRepository,
    SubscriptionTransition,
};

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_current_for_user(
        &self,
        user_id: Uuid,
    ) -> DbResult<Option<CurrentSubscriptionRow>> {
        let sub = sqlx::query_as::<_, CurrentSubscriptionRow>(
            r#"
            SELECT s.id, s.user_id, s.subscription_type_id, s.status, s.stripe_subscription_id,
                   s.stripe_customer_id, s.subscription_date,
                   t.name AS plan_name, t.abilities, t.max_riders_allowed
            FROM subscriptions s
            JOIN subscription_types t ON t.id = s.subscription_type_id
            WHERE s.user_id = $1 AND s.status = 'active'
            ORDER BY s.subscription_date DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn activate_from_checkout(
        &self,
        activation: CheckoutActivation,
    ) -> DbResult<CheckoutOutcome> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent checkouts for the same user
        let user: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(activation.user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if user.is_none() {
            return Ok(CheckoutOutcome::UnknownUser);
        }

        let plan: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM subscription_types WHERE id = $1")
                .bind(activation.plan_id)
                .fetch_optional(&mut *tx)
                .await?;
        if plan.is_none() {
            return Ok(CheckoutOutcome::UnknownPlan);
        }

        let superseded = sqlx::query(
            r#"
            UPDATE subscriptions SET status = $1, updated_at = NOW()
            WHERE user_id = $2 AND status = $3
            "#,
        )
        .bind(SubscriptionStatus::Expired.as_str())
        .bind(activation.user_id)
        .bind(SubscriptionStatus::Active.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let subscription = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscriptions (id, user_id, subscription_type_id, status,
                                       stripe_subscription_id, stripe_customer_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, subscription_type_id, status, stripe_subscription_id,
                      stripe_customer_id, subscription_date, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(activation.user_id)
        .bind(activation.plan_id)
        .bind(SubscriptionStatus::Active.as_str())
        .bind(&activation.stripe_subscription_id)
        .bind(&activation.stripe_customer_id)
        .fetch_one(&mut *tx)
        .await?;

        let settled = sqlx::query(
            r#"
            UPDATE transactions
            SET status = $1, amount_cents = $2, invoice_url = $3, transaction_date = NOW()
            WHERE transaction_code = $4 AND status = $5
            "#,
        )
        .bind(TransactionStatus::Paid.as_str())
        .bind(activation.amount_cents)
        .bind(&activation.invoice_url)
        .bind(&activation.session_id)
        .bind(TransactionStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if settled == 0 {
            sqlx::query(
                r#"
                INSERT INTO transactions (id, subscription_id, amount_cents, status,
                                          transaction_code, invoice_url)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(subscription.id)
            .bind(activation.amount_cents)
            .bind(TransactionStatus::Paid.as_str())
            .bind(&activation.session_id)
            .bind(&activation.invoice_url)
            .execute(&mut *tx)
            .await?;
        }

        insert_activity(&mut tx, activation.user_id, &activation.activity).await?;

        tx.commit().await?;

        debug!(
            subscription_id = %subscription.id,
            superseded,
            settled,
            "Checkout applied"
        );

        Ok(CheckoutOutcome::Activated {
            subscription,
            superseded,
            settled_pending: settled > 0,
        })
    }

    async fn apply_invoice_event(
        &self,
        event: InvoiceEvent,
    ) -> DbResult<Option<SubscriptionTransition>> {
        let mut tx = self.pool.begin().await?;

        let sub = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, subscription_type_id, status, stripe_subscription_id,
                   stripe_customer_id, subscription_date, created_at, updated_at
            FROM subscriptions
            WHERE stripe_subscription_id = $1
            ORDER BY subscription_date DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(&event.stripe_subscription_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(sub) = sub else {
            return Ok(None);
        };

        let from = sub.status()?;
        let to = from.apply(event.event);

        let transaction_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO transactions (id, subscription_id, amount_cents, status,
                                      transaction_code, invoice_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(transaction_id)
        .bind(sub.id)
        .bind(event.amount_cents)
        .bind(event.transaction_status.as_str())
        .bind(&event.transaction_code)
        .bind(&event.invoice_url)
        .execute(&mut *tx)
        .await?;

        if to != from {
            sqlx::query("UPDATE subscriptions SET status = $1, updated_at = NOW() WHERE id = $2")
                .bind(to.as_str())
                .bind(sub.id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(activity) = &event.activity {
            insert_activity(&mut tx, sub.user_id, activity).await?;
        }

        tx.commit().await?;

        Ok(Some(SubscriptionTransition {
            subscription_id: sub.id,
            user_id: sub.user_id,
            transaction_id,
            from,
            to,
        }))
    }
}
