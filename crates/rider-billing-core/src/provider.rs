//! Payment provider abstraction

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::BillingError;

/// Everything needed to open a subscription checkout
#[derive(Debug, Clone)]
pub struct CheckoutRequest<'a> {
    pub customer_email: &'a str,
    pub price_id: &'a str,
    /// Echoed back in the completed session's metadata as `userId`
    pub user_id: Uuid,
    /// Echoed back in the completed session's metadata as `subscriptionTypeId`
    pub plan_id: Uuid,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

/// Checkout session created at the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSession {
    /// Session ID
    pub session_id: String,
    /// Checkout URL
    pub url: String,
}

/// Payment provider trait
///
/// Abstracts payment processing to allow different providers (Stripe, etc.)
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a checkout session
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest<'_>,
    ) -> Result<CheckoutSession, BillingError>;
}
