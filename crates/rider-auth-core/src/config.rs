//! Configuration types for the auth service

use std::time::Duration;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret used to sign access tokens
    pub jwt_secret: String,
    /// Access token lifetime
    pub token_ttl: Duration,
    /// Plan assigned to newly registered users, if it exists
    pub default_plan: String,
}

impl AuthConfig {
    /// Create a new auth config
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
            default_plan: "free".to_string(),
        }
    }

    /// Set token lifetime
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Set the plan new users are subscribed to
    pub fn with_default_plan(mut self, plan: impl Into<String>) -> Self {
        self.default_plan = plan.into();
        self
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("default_plan", &self.default_plan)
            .finish()
    }
}
