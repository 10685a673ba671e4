//! Stripe webhook handling

use std::collections::HashMap;

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, instrument, warn};

use crate::error::BillingError;

type HmacSha256 = Hmac<Sha256>;

/// Default tolerance for the signed timestamp, in seconds
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Webhook event types we handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    /// Checkout session completed
    CheckoutSessionCompleted,
    /// Recurring invoice paid
    InvoicePaymentSucceeded,
    /// Recurring invoice payment failed
    InvoicePaymentFailed,
    /// Unknown event type
    Unknown(String),
}

impl WebhookEventType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::Unknown(other) => other,
        }
    }
}

impl From<&str> for WebhookEventType {
    fn from(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "invoice.payment_succeeded" => Self::InvoicePaymentSucceeded,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed webhook event
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Event ID
    pub id: String,
    /// Event type
    pub event_type: WebhookEventType,
    /// Event data
    pub data: WebhookEventData,
    /// When the event was created (Unix timestamp)
    pub created: i64,
}

/// Webhook event data
#[derive(Debug, Clone)]
pub enum WebhookEventData {
    /// Checkout session data
    CheckoutSession(CheckoutSessionData),
    /// Invoice data
    Invoice(InvoiceData),
    /// Raw JSON for unknown events
    Raw(serde_json::Value),
}

/// Checkout session completed data
#[derive(Debug, Clone, Default)]
pub struct CheckoutSessionData {
    /// Session ID; correlates with the pending transaction
    pub session_id: String,
    /// Customer ID
    pub customer_id: Option<String>,
    /// Subscription ID
    pub subscription_id: Option<String>,
    /// Total charged, in cents
    pub amount_total: i64,
    /// Invoice ID
    pub invoice_id: Option<String>,
    /// `userId` metadata, unparsed
    pub user_id: Option<String>,
    /// `subscriptionTypeId` metadata, unparsed
    pub plan_id: Option<String>,
}

/// Invoice event data
#[derive(Debug, Clone, Default)]
pub struct InvoiceData {
    /// Invoice ID
    pub invoice_id: String,
    /// Subscription ID
    pub subscription_id: Option<String>,
    /// Amount paid in cents
    pub amount_paid: i64,
    /// Amount due in cents
    pub amount_due: i64,
    /// Payment intent ID
    pub payment_intent: Option<String>,
    /// Hosted invoice URL
    pub hosted_invoice_url: Option<String>,
}

/// Webhook handler for processing Stripe events
#[derive(Clone)]
pub struct WebhookHandler {
    webhook_secret: String,
    tolerance_secs: i64,
}

impl WebhookHandler {
    /// Create a new webhook handler
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Set the timestamp tolerance
    pub fn with_tolerance_secs(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Verify and parse a webhook payload
    #[instrument(skip(self, payload, signature))]
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, BillingError> {
        self.verify_signature(payload, signature, Utc::now().timestamp())?;

        let raw_event: RawStripeEvent = serde_json::from_slice(payload)
            .map_err(|e| BillingError::InvalidPayload(e.to_string()))?;

        debug!(event_id = %raw_event.id, event_type = %raw_event.event_type, "Parsed webhook event");

        let event_type = WebhookEventType::from(raw_event.event_type.as_str());
        let data = Self::parse_event_data(&event_type, raw_event.data.object)?;

        Ok(WebhookEvent {
            id: raw_event.id,
            event_type,
            data,
            created: raw_event.created,
        })
    }

    /// Build a `Stripe-Signature` header value for a payload
    pub fn sign(&self, timestamp: i64, payload: &[u8]) -> Result<String, BillingError> {
        let mac = self.mac(timestamp, payload)?;
        Ok(format!(
            "t={timestamp},v1={}",
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    /// HMAC-SHA256 over `"{timestamp}.{payload}"`
    fn mac(&self, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, BillingError> {
        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| BillingError::Internal("HMAC error".to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }

    /// Verify Stripe webhook signature
    fn verify_signature(&self, payload: &[u8], signature: &str, now: i64) -> Result<(), BillingError> {
        // Parse signature header: t=timestamp,v1=signature[,v1=signature...]
        let mut timestamp: Option<&str> = None;
        let mut candidates: Vec<&str> = Vec::new();

        for part in signature.split(',') {
            if let Some((key, value)) = part.trim().split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => candidates.push(value),
                    _ => {}
                }
            }
        }

        let timestamp: i64 = timestamp
            .ok_or_else(|| {
                warn!("Missing timestamp in webhook signature");
                BillingError::SignatureInvalid("missing timestamp".to_string())
            })?
            .parse()
            .map_err(|_| BillingError::SignatureInvalid("invalid timestamp format".to_string()))?;

        if candidates.is_empty() {
            warn!("Missing v1 signature in webhook signature");
            return Err(BillingError::SignatureInvalid("missing signature".to_string()));
        }

        let mac = self.mac(timestamp, payload)?;
        let matched = candidates.iter().any(|candidate| {
            hex::decode(candidate)
                .map(|expected| mac.clone().verify_slice(&expected).is_ok())
                .unwrap_or(false)
        });

        if !matched {
            warn!("Webhook signature verification failed");
            return Err(BillingError::SignatureInvalid(
                "signature verification failed".to_string(),
            ));
        }

        if (now - timestamp).abs() > self.tolerance_secs {
            warn!(timestamp, now, "Webhook timestamp outside tolerance");
            return Err(BillingError::SignatureInvalid(
                "timestamp outside tolerance".to_string(),
            ));
        }

        Ok(())
    }

    /// Parse event data based on type
    fn parse_event_data(
        event_type: &WebhookEventType,
        object: serde_json::Value,
    ) -> Result<WebhookEventData, BillingError> {
        match event_type {
            WebhookEventType::CheckoutSessionCompleted => {
                let session: RawCheckoutSession = serde_json::from_value(object)
                    .map_err(|e| BillingError::InvalidPayload(e.to_string()))?;
                let mut metadata = session.metadata.unwrap_or_default();
                Ok(WebhookEventData::CheckoutSession(CheckoutSessionData {
                    session_id: session.id,
                    customer_id: session.customer.map(Expandable::into_id),
                    subscription_id: session.subscription.map(Expandable::into_id),
                    amount_total: session.amount_total.unwrap_or(0),
                    invoice_id: session.invoice.map(Expandable::into_id),
                    user_id: metadata.remove("userId"),
                    plan_id: metadata.remove("subscriptionTypeId"),
                }))
            }
            WebhookEventType::InvoicePaymentSucceeded | WebhookEventType::InvoicePaymentFailed => {
                let inv: RawInvoice = serde_json::from_value(object)
                    .map_err(|e| BillingError::InvalidPayload(e.to_string()))?;
                Ok(WebhookEventData::Invoice(InvoiceData {
                    invoice_id: inv.id,
                    subscription_id: inv.subscription.map(Expandable::into_id),
                    amount_paid: inv.amount_paid.unwrap_or(0),
                    amount_due: inv.amount_due.unwrap_or(0),
                    payment_intent: inv.payment_intent.map(Expandable::into_id),
                    hosted_invoice_url: inv.hosted_invoice_url,
                }))
            }
            WebhookEventType::Unknown(_) => Ok(WebhookEventData::Raw(object)),
        }
    }
}

// Raw Stripe event for parsing
#[derive(Debug, Deserialize)]
struct RawStripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
    #[serde(default)]
    created: i64,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

/// A reference Stripe may send either as an id or as the expanded object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    fn into_id(self) -> String {
        match self {
            Self::Id(id) | Self::Object { id } => id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawCheckoutSession {
    id: String,
    customer: Option<Expandable>,
    subscription: Option<Expandable>,
    amount_total: Option<i64>,
    invoice: Option<Expandable>,
    metadata: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct RawInvoice {
    id: String,
    subscription: Option<Expandable>,
    amount_paid: Option<i64>,
    amount_due: Option<i64>,
    payment_intent: Option<Expandable>,
    hosted_invoice_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "whsec_test";

    fn handler() -> WebhookHandler {
        WebhookHandler::new(SECRET)
    }

    fn checkout_payload() -> Vec<u8> {
        json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "created": 1_700_000_000,
            "data": {"object": {
                "id": "cs_test_1",
                "customer": "cus_1",
                "subscription": {"id": "sub_1", "object": "subscription"},
                "amount_total": 1999,
                "invoice": "in_1",
                "metadata": {"userId": "u", "subscriptionTypeId": "p"}
            }}
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn test_valid_signature_parses_checkout() {
        let payload = checkout_payload();
        let header = handler().sign(Utc::now().timestamp(), &payload).unwrap();

        let event = handler().verify_and_parse(&payload, &header).unwrap();
        assert_eq!(event.event_type, WebhookEventType::CheckoutSessionCompleted);
        let WebhookEventData::CheckoutSession(session) = event.data else {
            panic!("expected checkout data");
        };
        assert_eq!(session.session_id, "cs_test_1");
        assert_eq!(session.customer_id.as_deref(), Some("cus_1"));
        assert_eq!(session.subscription_id.as_deref(), Some("sub_1"));
        assert_eq!(session.amount_total, 1999);
        assert_eq!(session.user_id.as_deref(), Some("u"));
        assert_eq!(session.plan_id.as_deref(), Some("p"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = checkout_payload();
        let header = WebhookHandler::new("whsec_other")
            .sign(Utc::now().timestamp(), &payload)
            .unwrap();
        assert!(matches!(
            handler().verify_and_parse(&payload, &header),
            Err(BillingError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let payload = checkout_payload();
        let header = handler().sign(Utc::now().timestamp(), &payload).unwrap();
        let mut tampered = payload.clone();
        tampered.push(b' ');
        assert!(matches!(
            handler().verify_and_parse(&tampered, &header),
            Err(BillingError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = checkout_payload();
        let ts = Utc::now().timestamp() - 301;
        let header = handler().sign(ts, &payload).unwrap();
        assert!(matches!(
            handler().verify_and_parse(&payload, &header),
            Err(BillingError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn test_any_v1_may_match() {
        let payload = checkout_payload();
        let now = Utc::now().timestamp();
        let good = handler().sign(now, &payload).unwrap();
        let good_sig = good.split_once("v1=").map(|(_, s)| s).unwrap();
        let header = format!("t={now},v1={},v1={good_sig},v0=ignored", "00".repeat(32));
        assert!(handler().verify_and_parse(&payload, &header).is_ok());
    }

    #[test]
    fn test_malformed_headers() {
        let payload = checkout_payload();
        for header in ["", "v1=abcd", "t=abc,v1=abcd", "t=1700000000"] {
            assert!(
                matches!(
                    handler().verify_and_parse(&payload, header),
                    Err(BillingError::SignatureInvalid(_))
                ),
                "header {header:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_malformed_envelope() {
        let payload = br#"{"type":"invoice.payment_failed"}"#;
        let header = handler().sign(Utc::now().timestamp(), payload).unwrap();
        assert!(matches!(
            handler().verify_and_parse(payload, &header),
            Err(BillingError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_unknown_type_kept_raw() {
        let payload = json!({
            "id": "evt_2",
            "type": "customer.created",
            "created": 1,
            "data": {"object": {"id": "cus_1"}}
        })
        .to_string();
        let header = handler().sign(Utc::now().timestamp(), payload.as_bytes()).unwrap();
        let event = handler().verify_and_parse(payload.as_bytes(), &header).unwrap();
        assert_eq!(
            event.event_type,
            WebhookEventType::Unknown("customer.created".to_string())
        );
        assert!(matches!(event.data, WebhookEventData::Raw(_)));
    }

    #[test]
    fn test_invoice_parsing() {
        let payload = json!({
            "id": "evt_3",
            "type": "invoice.payment_failed",
            "created": 1,
            "data": {"object": {
                "id": "in_9",
                "subscription": "sub_1",
                "amount_paid": 0,
                "amount_due": 2900,
                "payment_intent": null,
                "hosted_invoice_url": "https://invoice.stripe.com/i/in_9"
            }}
        })
        .to_string();
        let header = handler().sign(Utc::now().timestamp(), payload.as_bytes()).unwrap();
        let event = handler().verify_and_parse(payload.as_bytes(), &header).unwrap();
        let WebhookEventData::Invoice(invoice) = event.data else {
            panic!("expected invoice data");
        };
        assert_eq!(invoice.subscription_id.as_deref(), Some("sub_1"));
        assert_eq!(invoice.amount_due, 2900);
        assert!(invoice.payment_intent.is_none());
    }
}
