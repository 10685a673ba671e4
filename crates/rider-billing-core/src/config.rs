//! Billing configuration

use std::time::Duration;

/// Default Stripe API base URL
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com/v1";

/// Billing service configuration
#[derive(Clone)]
pub struct BillingConfig {
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook secret
    pub stripe_webhook_secret: String,
    /// Stripe API base URL
    pub api_base: String,
    /// Front-end base URL the checkout returns to
    pub client_url: String,
    /// Maximum age of a signed webhook delivery
    pub webhook_tolerance: Duration,
}

impl BillingConfig {
    /// Create a new billing config
    pub fn new(
        stripe_secret_key: impl Into<String>,
        stripe_webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            stripe_secret_key: stripe_secret_key.into(),
            stripe_webhook_secret: stripe_webhook_secret.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            client_url: "http://localhost:3001".to_string(),
            webhook_tolerance: Duration::from_secs(300),
        }
    }

    /// Set the Stripe API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the front-end base URL
    pub fn with_client_url(mut self, client_url: impl Into<String>) -> Self {
        self.client_url = client_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the webhook timestamp tolerance
    pub fn with_webhook_tolerance(mut self, tolerance: Duration) -> Self {
        self.webhook_tolerance = tolerance;
        self
    }

    /// Checkout success URL; Stripe substitutes the session id placeholder
    pub fn success_url(&self) -> String {
        format!("{}/success?session_id={{CHECKOUT_SESSION_ID}}", self.client_url)
    }

    /// Checkout cancel URL
    pub fn cancel_url(&self) -> String {
        format!("{}/cancel", self.client_url)
    }
}

impl std::fmt::Debug for BillingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingConfig")
            .field("stripe_secret_key", &"[REDACTED]")
            .field("stripe_webhook_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("client_url", &self.client_url)
            .field("webhook_tolerance", &self.webhook_tolerance)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_urls() {
        let config = BillingConfig::new("sk", "whsec").with_client_url("https://app.example.com/");
        assert_eq!(
            config.success_url(),
            "https://app.example.com/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(config.cancel_url(), "https://app.example.com/cancel");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", BillingConfig::new("sk_live_secret", "whsec_secret"));
        assert!(!debug.contains("sk_live_secret"));
        assert!(!debug.contains("whsec_secret"));
    }
}
