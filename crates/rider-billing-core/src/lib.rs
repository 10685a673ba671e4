//! Rider Billing Core - Billing business logic
//!
//! Stripe checkout sessions for plan purchases and reconciliation of
//! Stripe webhook events into local subscriptions and transactions.
//!
//! # Example
//!
//! ```rust,ignore
//! use rider_billing_core::{BillingConfig, BillingService, StripeProvider};
//! use rider_db::Repositories;
//!
//! let config = BillingConfig::new("sk_test_...", "whsec_...")
//!     .with_client_url("https://app.example.com");
//! let provider = Arc::new(StripeProvider::new(config.clone()));
//!
//! let billing = BillingService::new(
//!     repos.subscriptions.clone(),
//!     repos.transactions.clone(),
//!     repos.plans.clone(),
//!     provider,
//!     config,
//! );
//!
//! // Start a checkout for a plan
//! let session = billing.create_checkout(user_id, "user@example.com", plan_id).await?;
//!
//! // Apply a webhook delivery
//! let outcome = billing.handle_webhook(&body, signature).await?;
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod service;
pub mod stripe;
pub mod webhook;

pub use config::BillingConfig;
pub use error::BillingError;
pub use provider::{CheckoutRequest, CheckoutSession, PaymentProvider};
pub use service::{BillingService, WebhookOutcome};
pub use stripe::StripeProvider;
pub use webhook::{
    CheckoutSessionData, InvoiceData, WebhookEvent, WebhookEventData, WebhookEventType,
    WebhookHandler,
};
