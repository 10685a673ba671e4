//! Repository traits
//!
//! Define async repository interfaces for database operations. Operations
//! that must be atomic (count-then-insert, subscription transitions) are
//! single trait methods so each implementation owns its transaction.

use async_trait::async_trait;
use uuid::Uuid;

use rider_types::{GrantScope, Permission, SubscriptionEvent, SubscriptionStatus, TransactionStatus};

use crate::error::DbResult;
use crate::models::*;

/// Entry appended to a user's activity log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub title: String,
    pub description: String,
}

impl NewActivity {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    /// Create a user, optionally with an active subscription to `default_plan_id`,
    /// in one transaction. A taken email yields [`DbError::Conflict`](crate::DbError).
    async fn create(&self, user: CreateUser) -> DbResult<UserRow>;

    /// Store (or clear) the hash of the user's current access token
    async fn set_token_hash(&self, id: Uuid, token_hash: Option<&str>) -> DbResult<()>;
}

/// Create user input
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub contact_phone: Option<String>,
    pub status: String,
    pub default_plan_id: Option<Uuid>,
}

/// Subscription plan repository trait
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// All plans, cheapest first
    async fn list(&self) -> DbResult<Vec<PlanRow>>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PlanRow>>;

    async fn find_by_name(&self, name: &str) -> DbResult<Option<PlanRow>>;

    /// Insert a plan or update the one with the same name
    async fn upsert(&self, plan: UpsertPlan) -> DbResult<PlanRow>;
}

/// Plan upsert input
#[derive(Debug, Clone)]
pub struct UpsertPlan {
    pub name: String,
    pub abilities: Vec<String>,
    pub max_riders_allowed: i32,
    pub stripe_price_id: Option<String>,
    pub price_cents: i64,
}

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Most recent active subscription for a user, with its plan
    async fn find_current_for_user(&self, user_id: Uuid)
        -> DbResult<Option<CurrentSubscriptionRow>>;

    /// Apply a completed checkout atomically: expire the user's active
    /// subscriptions, insert the new active one, settle or record the paid
    /// transaction and append the activity entry.
    async fn activate_from_checkout(&self, activation: CheckoutActivation)
        -> DbResult<CheckoutOutcome>;

    /// Apply a recurring invoice result atomically. Returns `None` when no
    /// subscription carries the provider reference; nothing is written then.
    async fn apply_invoice_event(&self, event: InvoiceEvent)
        -> DbResult<Option<SubscriptionTransition>>;
}

/// Completed checkout to apply
#[derive(Debug, Clone)]
pub struct CheckoutActivation {
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub stripe_subscription_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    /// Checkout session id; correlates with the pending transaction
    pub session_id: String,
    pub amount_cents: i64,
    pub invoice_url: Option<String>,
    pub activity: NewActivity,
}

/// Result of applying a completed checkout
#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    Activated {
        subscription: SubscriptionRow,
        /// Number of previously active subscriptions that were expired
        superseded: u64,
        /// Whether a pending transaction was settled (vs. a new one recorded)
        settled_pending: bool,
    },
    UnknownUser,
    UnknownPlan,
}

/// Recurring invoice result to apply
#[derive(Debug, Clone)]
pub struct InvoiceEvent {
    pub stripe_subscription_id: String,
    pub event: SubscriptionEvent,
    pub transaction_status: TransactionStatus,
    pub amount_cents: i64,
    pub transaction_code: String,
    pub invoice_url: Option<String>,
    pub activity: Option<NewActivity>,
}

/// What applying an invoice event did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionTransition {
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub transaction_id: Uuid,
    pub from: SubscriptionStatus,
    pub to: SubscriptionStatus,
}

/// Transaction repository trait
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Record a pending transaction for a checkout session
    async fn create_pending(
        &self,
        subscription_id: Uuid,
        transaction_code: &str,
    ) -> DbResult<TransactionRow>;

    /// All transactions on the user's subscriptions, newest first
    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<TransactionRow>>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TransactionRow>>;
}

/// Sharing grant repository trait
///
/// Rider and project grants live in separate tables; `scope` selects one.
#[async_trait]
pub trait GrantRepository: Send + Sync {
    /// All grants on a resource
    async fn list(&self, scope: GrantScope, resource_id: Uuid) -> DbResult<Vec<GrantRow>>;

    /// All grants on any of the resources
    async fn list_for_resources(
        &self,
        scope: GrantScope,
        resource_ids: &[Uuid],
    ) -> DbResult<Vec<GrantRow>>;

    /// Grants on a resource for one grantee
    async fn find_for_email(
        &self,
        scope: GrantScope,
        resource_id: Uuid,
        email: &str,
    ) -> DbResult<Vec<GrantRow>>;

    /// Create a grant. A second grant for the same (resource, email) yields
    /// [`DbError::Conflict`](crate::DbError).
    async fn create(
        &self,
        scope: GrantScope,
        resource_id: Uuid,
        email: &str,
        permission: Permission,
    ) -> DbResult<GrantRow>;

    /// Change a grant's level; `None` if the grant is not on this resource
    async fn update_permission(
        &self,
        scope: GrantScope,
        resource_id: Uuid,
        grant_id: Uuid,
        permission: Permission,
    ) -> DbResult<Option<GrantRow>>;

    /// Remove a grant; `false` if the grant is not on this resource
    async fn delete(&self, scope: GrantScope, resource_id: Uuid, grant_id: Uuid) -> DbResult<bool>;
}

/// Project repository trait
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn list_by_owner(&self, user_id: Uuid) -> DbResult<Vec<ProjectRow>>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ProjectRow>>;

    async fn create(&self, user_id: Uuid, name: &str) -> DbResult<ProjectRow>;

    async fn rename(&self, id: Uuid, name: &str) -> DbResult<Option<ProjectRow>>;

    async fn delete(&self, id: Uuid) -> DbResult<bool>;
}

/// Rider repository trait
#[async_trait]
pub trait RiderRepository: Send + Sync {
    /// Riders owned by a user, newest first, optionally within one project
    async fn list_by_owner(&self, owner_id: Uuid, project_id: Option<Uuid>)
        -> DbResult<Vec<RiderRow>>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<RiderRow>>;

    /// Count the owner's riders and insert the new one in one transaction,
    /// serialized per owner. `allow` receives the current count; when it
    /// returns `false` nothing is written and `None` is returned.
    async fn create_within_quota(
        &self,
        rider: CreateRider,
        allow: &(dyn Fn(i64) -> bool + Send + Sync),
    ) -> DbResult<Option<RiderRow>>;

    /// Partial update plus activity entry; `None` if the rider is gone
    async fn update(
        &self,
        id: Uuid,
        changes: UpdateRider,
        activity: NewActivity,
    ) -> DbResult<Option<RiderRow>>;

    /// Delete plus activity entry for `actor_id`; `false` if the rider is gone
    async fn delete(&self, id: Uuid, actor_id: Uuid, activity: NewActivity) -> DbResult<bool>;
}

/// Create rider input
#[derive(Debug, Clone)]
pub struct CreateRider {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub project_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub data: Option<serde_json::Value>,
    pub activity: NewActivity,
}

/// Rider changes. Outer `None` leaves a field untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateRider {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub data: Option<Option<serde_json::Value>>,
    pub project_id: Option<Option<Uuid>>,
    /// User whose activity log receives the entry
    pub actor_id: Uuid,
}

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Comments on a rider, newest first
    async fn list_for_rider(&self, rider_id: Uuid) -> DbResult<Vec<CommentRow>>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<CommentRow>>;

    /// Insert a comment and the author's activity entry in one transaction
    async fn create(&self, comment: CreateComment, activity: NewActivity) -> DbResult<CommentRow>;

    async fn update(&self, id: Uuid, changes: UpdateComment) -> DbResult<Option<CommentRow>>;

    async fn delete(&self, id: Uuid) -> DbResult<bool>;
}

/// Create comment input
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub id: Uuid,
    pub rider_id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub status: Option<String>,
    pub position_xy: Option<serde_json::Value>,
}

/// Comment changes; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateComment {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
    pub position_xy: Option<serde_json::Value>,
}

/// Activity log repository trait
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Most recent entries first
    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<ActivityRow>>;

    async fn record(&self, user_id: Uuid, activity: NewActivity) -> DbResult<ActivityRow>;
}

/// Favorites repository trait
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<FavoriteRow>>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<FavoriteRow>>;

    async fn create(&self, user_id: Uuid, name: &str, data: serde_json::Value)
        -> DbResult<FavoriteRow>;

    async fn delete(&self, id: Uuid) -> DbResult<bool>;
}
