//! Application state for the rider API service.

use std::sync::Arc;

use rider_auth_core::{AuthService, GrantManager, PermissionResolver, QuotaEnforcer};
use rider_billing_core::{BillingService, StripeProvider};
use rider_db::pg::{
    PgGrantRepository, PgPlanRepository, PgRiderRepository, PgSubscriptionRepository,
    PgTransactionRepository, PgUserRepository,
};
use rider_db::{DbPool, Repositories};

use crate::config::Config;
use crate::rate_limit::RateLimits;
use crate::sync::BdsSync;

pub type Auth = AuthService<PgUserRepository, PgPlanRepository>;
pub type Billing = BillingService<PgSubscriptionRepository, PgTransactionRepository, PgPlanRepository>;
pub type Resolver = PermissionResolver<PgUserRepository, PgGrantRepository>;
pub type Quota = QuotaEnforcer<PgSubscriptionRepository, PgRiderRepository>;
pub type Sharing = GrantManager<PgGrantRepository>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Registration, login and token checks
    pub auth: Arc<Auth>,
    /// Checkout and webhook reconciliation
    pub billing: Arc<Billing>,
    /// Rider access decisions
    pub resolver: Resolver,
    /// Quota-checked rider creation
    pub quota: Quota,
    /// Rider and project grants
    pub sharing: Sharing,
    /// Database repositories
    pub repos: Repositories,
    /// Database pool (readiness probe)
    pub pool: DbPool,
    /// Per-IP request limiters
    pub limits: Arc<RateLimits>,
    /// Upstream BDS sync
    pub bds: Arc<BdsSync>,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire services and repositories over one pool
    pub fn new(pool: DbPool, config: Config) -> Self {
        let repos = Repositories::new(pool.clone());
        let users = Arc::new(repos.users.clone());
        let plans = Arc::new(repos.plans.clone());

        let auth = AuthService::new(users.clone(), plans.clone(), config.auth.clone());

        let provider = Arc::new(StripeProvider::new(config.billing.clone()));
        let subscriptions = Arc::new(repos.subscriptions.clone());
        let billing = BillingService::new(
            subscriptions.clone(),
            Arc::new(repos.transactions.clone()),
            plans,
            provider,
            config.billing.clone(),
        );

        let grants = Arc::new(repos.grants.clone());
        let resolver = PermissionResolver::new(users, grants.clone());
        let quota = QuotaEnforcer::new(subscriptions, Arc::new(repos.riders.clone()));
        let sharing = GrantManager::new(grants);

        Self {
            auth: Arc::new(auth),
            billing: Arc::new(billing),
            resolver,
            quota,
            sharing,
            repos,
            pool,
            limits: Arc::new(RateLimits::new(&config.rate_limit)),
            bds: Arc::new(BdsSync::new(&config.bds)),
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
