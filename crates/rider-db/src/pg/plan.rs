//! PostgreSQL subscription plan repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::PlanRow;
use crate::repo::{PlanRepository, UpsertPlan};

/// PostgreSQL plan repository
#[derive(Clone)]
pub struct PgPlanRepository {
    pool: PgPool,
}

impl PgPlanRepository {
    /// Create a new plan repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    async fn list(&self) -> DbResult<Vec<PlanRow>> {
        let plans = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, name, abilities, max_riders_allowed, stripe_price_id, price_cents, created_at
            FROM subscription_types
            ORDER BY price_cents, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(plans)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PlanRow>> {
        let plan = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, name, abilities, max_riders_allowed, stripe_price_id, price_cents, created_at
            FROM subscription_types
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }

    async fn find_by_name(&self, name: &str) -> DbResult<Option<PlanRow>> {
        let plan = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, name, abilities, max_riders_allowed, stripe_price_id, price_cents, created_at
            FROM subscription_types
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }

    async fn upsert(&self, plan: UpsertPlan) -> DbResult<PlanRow> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"
            INSERT INTO subscription_types (id, name, abilities, max_riders_allowed,
                                            stripe_price_id, price_cents)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO UPDATE
            SET abilities = EXCLUDED.abilities,
                max_riders_allowed = EXCLUDED.max_riders_allowed,
                stripe_price_id = COALESCE(EXCLUDED.stripe_price_id, subscription_types.stripe_price_id),
                price_cents = EXCLUDED.price_cents
            RETURNING id, name, abilities, max_riders_allowed, stripe_price_id, price_cents, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&plan.name)
        .bind(&plan.abilities)
        .bind(plan.max_riders_allowed)
        .bind(&plan.stripe_price_id)
        .bind(plan.price_cents)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
