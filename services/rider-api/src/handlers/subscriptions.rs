//! Subscription handlers: plans, current subscription, checkout, transactions

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use rider_billing_core::CheckoutSession;
use rider_db::{
    CurrentSubscriptionRow, PlanRepository, PlanRow, SubscriptionRepository,
    TransactionRepository, TransactionRow,
};

use super::shared::{record_op_duration, require_owner};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, ApiPath, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(alias = "subscriptionTypeId")]
    pub subscription_type_id: Option<Uuid>,
}

/// GET /subscriptions/types
pub async fn list_plans(State(state): State<AppState>) -> ApiResult<Json<Vec<PlanRow>>> {
    Ok(Json(state.repos.plans.list().await?))
}

/// GET /subscriptions/my-subscription
pub async fn my_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<CurrentSubscriptionRow>> {
    state
        .repos
        .subscriptions
        .find_current_for_user(user.id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Active subscription"))
}

/// POST /subscriptions/checkout
pub async fn create_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> ApiResult<Json<CheckoutSession>> {
    let plan_id = req
        .subscription_type_id
        .ok_or_else(|| ApiError::Validation("subscription_type_id is required".to_string()))?;

    let start = Instant::now();
    let result = state
        .billing
        .create_checkout(user.id, &user.email, plan_id)
        .await;
    record_op_duration("create_checkout", start, result.is_ok());

    let session = result?;
    metrics::counter!("rider_checkouts_created_total").increment(1);
    Ok(Json(session))
}

/// GET /subscriptions/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<TransactionRow>>> {
    Ok(Json(state.repos.transactions.list_for_user(user.id).await?))
}

/// GET /subscriptions/transactions/{id}
pub async fn get_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<TransactionRow>> {
    let transaction = state
        .repos
        .transactions
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Transaction"))?;
    require_owner(transaction.user_id, &user, "This transaction belongs to another user")?;
    Ok(Json(transaction))
}
