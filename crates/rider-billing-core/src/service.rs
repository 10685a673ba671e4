//! Billing service
//!
//! Opens Stripe checkouts and reconciles Stripe webhook deliveries into local
//! subscriptions and transactions. Deliveries that cannot be correlated with
//! local state are logged and acknowledged; only signature and payload
//! failures and store errors are reported back to the caller.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use rider_db::{
    CheckoutActivation, CheckoutOutcome, InvoiceEvent, NewActivity, PlanRepository,
    SubscriptionRepository, TransactionRepository,
};
use rider_types::{SubscriptionEvent, SubscriptionStatus, TransactionStatus};

use crate::provider::{CheckoutRequest, CheckoutSession, PaymentProvider};
use crate::webhook::{
    CheckoutSessionData, InvoiceData, WebhookEvent, WebhookEventData, WebhookEventType,
    WebhookHandler,
};
use crate::{BillingConfig, BillingError};

/// What a webhook delivery did to local state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// State was updated
    Applied,
    /// Recognized event that could not be correlated; nothing written
    Skipped(&'static str),
    /// Event type this service does not act on
    Unhandled(String),
}

impl WebhookOutcome {
    /// Metrics label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Skipped(_) => "skipped",
            Self::Unhandled(_) => "unhandled",
        }
    }
}

/// Billing service
pub struct BillingService<S, T, P>
where
    S: SubscriptionRepository,
    T: TransactionRepository,
    P: PlanRepository,
{
    subscriptions: Arc<S>,
    transactions: Arc<T>,
    plans: Arc<P>,
    provider: Arc<dyn PaymentProvider>,
    webhooks: WebhookHandler,
    config: BillingConfig,
}

impl<S, T, P> BillingService<S, T, P>
where
    S: SubscriptionRepository,
    T: TransactionRepository,
    P: PlanRepository,
{
    /// Create a new billing service
    pub fn new(
        subscriptions: Arc<S>,
        transactions: Arc<T>,
        plans: Arc<P>,
        provider: Arc<dyn PaymentProvider>,
        config: BillingConfig,
    ) -> Self {
        let tolerance = i64::try_from(config.webhook_tolerance.as_secs()).unwrap_or(i64::MAX);
        Self {
            subscriptions,
            transactions,
            plans,
            provider,
            webhooks: WebhookHandler::new(config.stripe_webhook_secret.clone())
                .with_tolerance_secs(tolerance),
            config,
        }
    }

    /// Webhook verifier configured with this service's secret
    pub fn webhooks(&self) -> &WebhookHandler {
        &self.webhooks
    }

    /// Open a Stripe checkout for a plan and record a pending transaction
    /// against the user's current subscription, keyed by the session id.
    #[instrument(skip(self, email))]
    pub async fn create_checkout(
        &self,
        user_id: Uuid,
        email: &str,
        plan_id: Uuid,
    ) -> Result<CheckoutSession, BillingError> {
        let plan = self
            .plans
            .find_by_id(plan_id)
            .await?
            .ok_or(BillingError::PlanNotFound)?;

        let price_id = plan
            .stripe_price_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(BillingError::PlanNotPurchasable)?;

        let success_url = self.config.success_url();
        let cancel_url = self.config.cancel_url();
        let session = self
            .provider
            .create_checkout_session(&CheckoutRequest {
                customer_email: email,
                price_id,
                user_id,
                plan_id,
                success_url: &success_url,
                cancel_url: &cancel_url,
            })
            .await?;

        match self.subscriptions.find_current_for_user(user_id).await? {
            Some(current) => {
                self.transactions
                    .create_pending(current.id, &session.session_id)
                    .await?;
            }
            None => {
                warn!(user_id = %user_id, "No current subscription; checkout has no pending transaction");
            }
        }

        info!(user_id = %user_id, plan = %plan.name, session_id = %session.session_id, "Checkout session created");

        Ok(session)
    }

    /// Verify a webhook delivery and apply it
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookOutcome, BillingError> {
        let event = self.webhooks.verify_and_parse(payload, signature)?;
        self.apply_event(event).await
    }

    /// Apply an already verified event
    #[instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn apply_event(&self, event: WebhookEvent) -> Result<WebhookOutcome, BillingError> {
        let outcome = match (&event.event_type, event.data) {
            (WebhookEventType::CheckoutSessionCompleted, WebhookEventData::CheckoutSession(session)) => {
                self.checkout_completed(session).await?
            }
            (WebhookEventType::InvoicePaymentSucceeded, WebhookEventData::Invoice(invoice)) => {
                self.invoice_paid(invoice).await?
            }
            (WebhookEventType::InvoicePaymentFailed, WebhookEventData::Invoice(invoice)) => {
                self.invoice_failed(invoice).await?
            }
            (event_type, _) => {
                info!("Unhandled webhook event type");
                WebhookOutcome::Unhandled(event_type.to_string())
            }
        };

        Ok(outcome)
    }

    async fn checkout_completed(
        &self,
        session: CheckoutSessionData,
    ) -> Result<WebhookOutcome, BillingError> {
        let user_id = session.user_id.as_deref().and_then(|v| Uuid::parse_str(v).ok());
        let plan_id = session.plan_id.as_deref().and_then(|v| Uuid::parse_str(v).ok());
        let (Some(user_id), Some(plan_id)) = (user_id, plan_id) else {
            warn!(session_id = %session.session_id, "Checkout session missing metadata");
            return Ok(WebhookOutcome::Skipped("missing metadata"));
        };

        let outcome = self
            .subscriptions
            .activate_from_checkout(CheckoutActivation {
                user_id,
                plan_id,
                stripe_subscription_id: session.subscription_id,
                stripe_customer_id: session.customer_id,
                session_id: session.session_id,
                amount_cents: session.amount_total,
                invoice_url: session.invoice_id,
                activity: NewActivity::new(
                    "Subscription Activated",
                    "New subscription activated successfully",
                ),
            })
            .await?;

        match outcome {
            CheckoutOutcome::Activated {
                subscription,
                superseded,
                settled_pending,
            } => {
                info!(
                    user_id = %user_id,
                    subscription_id = %subscription.id,
                    superseded,
                    settled_pending,
                    "Subscription activated"
                );
                Ok(WebhookOutcome::Applied)
            }
            CheckoutOutcome::UnknownUser => {
                warn!(user_id = %user_id, "Checkout for unknown user");
                Ok(WebhookOutcome::Skipped("unknown user"))
            }
            CheckoutOutcome::UnknownPlan => {
                warn!(plan_id = %plan_id, "Checkout for unknown plan");
                Ok(WebhookOutcome::Skipped("unknown plan"))
            }
        }
    }

    async fn invoice_paid(&self, invoice: InvoiceData) -> Result<WebhookOutcome, BillingError> {
        let Some(stripe_subscription_id) = invoice.subscription_id else {
            warn!(invoice_id = %invoice.invoice_id, "Invoice without subscription");
            return Ok(WebhookOutcome::Skipped("invoice without subscription"));
        };

        let transition = self
            .subscriptions
            .apply_invoice_event(InvoiceEvent {
                stripe_subscription_id,
                event: SubscriptionEvent::PaymentSucceeded,
                transaction_status: TransactionStatus::Paid,
                amount_cents: invoice.amount_paid,
                transaction_code: invoice.payment_intent.unwrap_or(invoice.invoice_id),
                invoice_url: invoice.hosted_invoice_url,
                activity: None,
            })
            .await?;

        let Some(transition) = transition else {
            warn!("Subscription not found for paid invoice");
            return Ok(WebhookOutcome::Skipped("unknown subscription"));
        };

        if transition.from == SubscriptionStatus::Expired {
            warn!(subscription_id = %transition.subscription_id, "Paid invoice reactivated an expired subscription");
        }
        info!(subscription_id = %transition.subscription_id, from = %transition.from, to = %transition.to, "Payment recorded");

        Ok(WebhookOutcome::Applied)
    }

    async fn invoice_failed(&self, invoice: InvoiceData) -> Result<WebhookOutcome, BillingError> {
        let Some(stripe_subscription_id) = invoice.subscription_id else {
            warn!(invoice_id = %invoice.invoice_id, "Invoice without subscription");
            return Ok(WebhookOutcome::Skipped("invoice without subscription"));
        };

        let transition = self
            .subscriptions
            .apply_invoice_event(InvoiceEvent {
                stripe_subscription_id,
                event: SubscriptionEvent::PaymentFailed,
                transaction_status: TransactionStatus::Failed,
                amount_cents: invoice.amount_due,
                transaction_code: invoice.payment_intent.unwrap_or_else(|| "failed".to_string()),
                invoice_url: invoice.hosted_invoice_url,
                activity: Some(NewActivity::new(
                    "Payment Failed",
                    "Subscription payment failed - subscription paused",
                )),
            })
            .await?;

        let Some(transition) = transition else {
            warn!("Subscription not found for failed invoice");
            return Ok(WebhookOutcome::Skipped("unknown subscription"));
        };

        info!(subscription_id = %transition.subscription_id, from = %transition.from, "Payment failed; subscription paused");

        Ok(WebhookOutcome::Applied)
    }
}
