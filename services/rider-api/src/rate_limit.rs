//! Per-IP request limiting using the governor crate.
//!
//! Two limiters share one window: a general one for API routes and a
//! stricter one for register and login.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::RateLimitConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// Token bucket per client IP
pub struct IpRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
}

impl IpRateLimiter {
    /// Allow `max_requests` per `window`, all of them usable as a burst
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let burst = NonZeroU32::new(max_requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(window / burst.get())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }

    /// Take one request from the IP's bucket
    pub fn check(&self, ip: IpAddr) -> Result<(), ApiError> {
        self.limiter.check_key(&ip).map_err(|not_until| {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            ApiError::RateLimited {
                retry_after_secs: wait.as_secs().max(1),
            }
        })
    }

    /// Forget IPs whose bucket has refilled completely
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Number of IPs currently tracked
    pub fn tracked(&self) -> usize {
        self.limiter.len()
    }
}

/// Limiters applied by the router
pub struct RateLimits {
    pub api: IpRateLimiter,
    pub auth: IpRateLimiter,
}

impl RateLimits {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            api: IpRateLimiter::new(config.max_requests, config.window),
            auth: IpRateLimiter::new(config.auth_max_requests, config.window),
        }
    }

    pub fn prune(&self) {
        self.api.prune();
        self.auth.prune();
    }

    /// Prune both limiters every `every` until the task is aborted
    pub fn spawn_pruning(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.prune();
                debug!(
                    api = self.api.tracked(),
                    auth = self.auth.tracked(),
                    "Rate limiter buckets pruned"
                );
            }
        })
    }
}

fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn rejected(bucket: &'static str, err: ApiError) -> ApiError {
    metrics::counter!("rider_rate_limited_total", "bucket" => bucket).increment(1);
    err
}

/// Middleware for general API routes
pub async fn limit_api(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state
        .limits
        .api
        .check(client_ip(&request))
        .map_err(|e| rejected("api", e))?;
    Ok(next.run(request).await)
}

/// Middleware for register and login
pub async fn limit_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state
        .limits
        .auth
        .check(client_ip(&request))
        .map_err(|e| rejected("auth", e))?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCAL: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[test]
    fn test_allows_up_to_max_then_rejects() {
        let limiter = IpRateLimiter::new(5, Duration::from_secs(900));
        for _ in 0..5 {
            assert!(limiter.check(LOCAL).is_ok());
        }

        match limiter.check(LOCAL) {
            Err(ApiError::RateLimited { retry_after_secs }) => {
                assert!(retry_after_secs > 0);
                assert!(retry_after_secs <= 180);
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[test]
    fn test_ips_are_independent() {
        let limiter = IpRateLimiter::new(1, Duration::from_secs(60));
        let other = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        assert!(limiter.check(LOCAL).is_ok());
        assert!(limiter.check(LOCAL).is_err());
        assert!(limiter.check(other).is_ok());
        assert_eq!(limiter.tracked(), 2);
    }

    #[test]
    fn test_zero_max_still_allows_one() {
        let limiter = IpRateLimiter::new(0, Duration::from_secs(60));
        assert!(limiter.check(LOCAL).is_ok());
        assert!(limiter.check(LOCAL).is_err());
    }

    #[tokio::test]
    async fn test_prune_forgets_refilled_buckets() {
        let limiter = IpRateLimiter::new(2, Duration::from_millis(20));
        let other = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        assert!(limiter.check(LOCAL).is_ok());
        assert!(limiter.check(other).is_ok());
        assert_eq!(limiter.tracked(), 2);

        tokio::time::sleep(Duration::from_millis(60)).await;
        limiter.prune();
        assert_eq!(limiter.tracked(), 0);

        // A pruned IP starts again with a full bucket
        assert!(limiter.check(LOCAL).is_ok());
        assert!(limiter.check(LOCAL).is_ok());
        assert!(limiter.check(LOCAL).is_err());
    }

    #[test]
    fn test_prune_keeps_active_buckets() {
        let limiter = IpRateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.check(LOCAL).is_ok());
        limiter.prune();
        assert_eq!(limiter.tracked(), 1);
        assert!(limiter.check(LOCAL).is_ok());
        assert!(limiter.check(LOCAL).is_err());
    }
}
