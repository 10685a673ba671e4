//! Billing errors

use thiserror::Error;

/// Billing errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// Plan not found
    #[error("plan not found")]
    PlanNotFound,

    /// Plan has no Stripe price and cannot be bought
    #[error("plan is not available for purchase")]
    PlanNotPurchasable,

    /// Payment provider error
    #[error("provider error: {0}")]
    ProviderError(String),

    /// Webhook signature missing, malformed, wrong or stale
    #[error("invalid webhook signature: {0}")]
    SignatureInvalid(String),

    /// Webhook body could not be parsed
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rider_db::DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Check if the webhook delivery was rejected before any processing
    pub fn is_rejected_delivery(&self) -> bool {
        matches!(self, Self::SignatureInvalid(_) | Self::InvalidPayload(_))
    }
}
