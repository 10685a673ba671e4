//! Rider API
//!
//! REST service for riders, projects, sharing and subscription billing.
//!
//! ## REST Endpoints
//!
//! - `POST /auth/register`, `POST /auth/login` - Accounts (strict rate limit)
//! - `GET /auth/me`, `POST /auth/logout` - Current session
//! - `/projects`, `/projects/{id}`, `/projects/{id}/permissions[/{pid}]` - Projects and project sharing
//! - `/riders`, `/riders/{id}`, `/riders/{id}/permissions[/{pid}]` - Riders and rider sharing
//! - `/riders/{id}/comments[/{cid}]` - Comments
//! - `/subscriptions/types`, `/subscriptions/my-subscription` - Plans and current subscription
//! - `POST /subscriptions/checkout` - Create checkout session
//! - `/subscriptions/transactions[/{id}]` - Payment history
//! - `/user/activities`, `/user/favorites[/{id}]` - Activity log and favorites
//! - `POST /sync/refresh` - Trigger an upstream BDS sync
//! - `POST /webhook/stripe` - Stripe webhook handler
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod rate_limit;
pub mod router;
pub mod state;
pub mod sync;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use router::{build_router, setup_metrics};
pub use state::AppState;
