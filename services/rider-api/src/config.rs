//! Configuration for the rider API service.

use std::time::Duration;

use rider_auth_core::AuthConfig;
use rider_billing_core::BillingConfig;

/// Rider API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Auth core configuration
    pub auth: AuthConfig,
    /// Billing core configuration
    pub billing: BillingConfig,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
    /// Per-IP request limits
    pub rate_limit: RateLimitConfig,
    /// Upstream BDS sync
    pub bds: BdsConfig,
}

/// Per-IP request limits
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Window the limits apply to
    pub window: Duration,
    /// Requests per window on API routes
    pub max_requests: u32,
    /// Requests per window on register and login
    pub auth_max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(900_000), // 15 minutes
            max_requests: 100,
            auth_max_requests: 5,
        }
    }
}

/// Upstream BDS sync settings
#[derive(Debug, Clone)]
pub struct BdsConfig {
    pub enabled: bool,
    pub api_url: String,
    pub interval: Duration,
}

impl Default for BdsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "http://localhost:3000".to_string(),
            interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Database
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        // Server port
        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "4000".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Auth
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        let jwt_ttl_secs: u64 = std::env::var("JWT_TTL_SECS")
            .unwrap_or_else(|_| "604800".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("JWT_TTL_SECS"))?;

        // Stripe configuration
        let stripe_secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| ConfigError::Missing("STRIPE_SECRET_KEY"))?;

        let stripe_webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?;

        let stripe_api_base = std::env::var("STRIPE_API_BASE")
            .unwrap_or_else(|_| rider_billing_core::config::DEFAULT_API_BASE.to_string());

        let client_url =
            std::env::var("CLIENT_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());

        // Request timeout
        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        // Metrics
        let metrics_enabled = std::env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        // Rate limiting
        let window_ms: u64 = std::env::var("RATE_LIMIT_WINDOW_MS")
            .unwrap_or_else(|_| "900000".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("RATE_LIMIT_WINDOW_MS"))?;

        let max_requests = std::env::var("RATE_LIMIT_MAX_REQUESTS")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("RATE_LIMIT_MAX_REQUESTS"))?;

        let auth_max_requests = std::env::var("AUTH_RATE_LIMIT_MAX_REQUESTS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("AUTH_RATE_LIMIT_MAX_REQUESTS"))?;

        // BDS sync
        let bds_enabled = std::env::var("BDS_SYNC_ENABLED").is_ok_and(|v| v == "true");

        let bds_api_url =
            std::env::var("BDS_API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let bds_interval_secs: u64 = std::env::var("BDS_SYNC_INTERVAL_SECS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("BDS_SYNC_INTERVAL_SECS"))?;

        let auth = AuthConfig::new(jwt_secret).with_token_ttl(Duration::from_secs(jwt_ttl_secs));

        let billing = BillingConfig::new(stripe_secret_key, stripe_webhook_secret)
            .with_api_base(stripe_api_base)
            .with_client_url(client_url);

        Ok(Self {
            http_port,
            database_url,
            auth,
            billing,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
            rate_limit: RateLimitConfig {
                window: Duration::from_millis(window_ms),
                max_requests,
                auth_max_requests,
            },
            bds: BdsConfig {
                enabled: bds_enabled,
                api_url: bds_api_url,
                interval: Duration::from_secs(bds_interval_secs.max(1)),
            },
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
