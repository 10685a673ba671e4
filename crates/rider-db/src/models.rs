//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use rider_types::{Permission, SubscriptionStatus, UserStatus};

use crate::error::DbResult;

/// User row from the database
///
/// Not serializable: carries the password hash.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub contact_phone: Option<String>,
    pub status: String,
    pub token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn status(&self) -> DbResult<UserStatus> {
        Ok(self.status.parse()?)
    }
}

/// Subscription plan row (`subscription_types`)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlanRow {
    pub id: Uuid,
    pub name: String,
    pub abilities: Vec<String>,
    pub max_riders_allowed: i32,
    pub stripe_price_id: Option<String>,
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Subscription row from the database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_type_id: Uuid,
    pub status: String,
    pub stripe_subscription_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub subscription_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRow {
    pub fn status(&self) -> DbResult<SubscriptionStatus> {
        Ok(self.status.parse()?)
    }
}

/// A user's current subscription joined with its plan
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CurrentSubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_type_id: Uuid,
    pub status: String,
    pub stripe_subscription_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub subscription_date: DateTime<Utc>,
    pub plan_name: String,
    pub abilities: Vec<String>,
    pub max_riders_allowed: i32,
}

/// Transaction row, joined with the owning user of its subscription
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TransactionRow {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub amount_cents: i64,
    pub status: String,
    pub transaction_code: String,
    pub invoice_url: Option<String>,
    pub transaction_date: DateTime<Utc>,
}

/// Project row from the database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rider row from the database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RiderRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub project_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sharing grant on a rider or a project
///
/// Both permission tables are read into this shape; `resource_id` is the
/// rider id or project id depending on the table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GrantRow {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub email: String,
    pub permission: String,
    pub created_at: DateTime<Utc>,
}

impl GrantRow {
    pub fn permission(&self) -> DbResult<Permission> {
        Ok(self.permission.parse()?)
    }
}

/// Comment row from the database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommentRow {
    pub id: Uuid,
    pub rider_id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub status: Option<String>,
    pub position_xy: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Activity log row (`user_logs`)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActivityRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Favorite row from the database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FavoriteRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(permission: &str) -> GrantRow {
        GrantRow {
            id: Uuid::new_v4(),
            resource_id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            permission: permission.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_grant_permission_parses() {
        assert_eq!(grant("edit").permission().unwrap(), Permission::Edit);
        assert!(grant("owner").permission().is_err());
    }
}
