//! Periodic pull from the upstream BDS image service.
//!
//! The sync only counts what the upstream reports; nothing is persisted.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::BdsConfig;

/// Sync errors
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("unexpected response body: {0}")]
    InvalidBody(&'static str),
}

/// Result of one sync pass
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub enabled: bool,
    pub images: usize,
    pub synced_at: DateTime<Utc>,
}

/// BDS sync client
pub struct BdsSync {
    client: reqwest::Client,
    base_url: String,
    enabled: bool,
    interval: Duration,
}

impl BdsSync {
    pub fn new(config: &BdsConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            enabled: config.enabled,
            interval: config.interval,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Fetch the upstream image list once
    pub async fn run_once(&self) -> Result<SyncReport, SyncError> {
        if !self.enabled {
            info!("BDS sync is disabled");
            return Ok(SyncReport {
                enabled: false,
                images: 0,
                synced_at: Utc::now(),
            });
        }

        let url = format!("{}/images", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status(status.as_u16()));
        }

        let body: serde_json::Value = response.json().await?;
        let images = body
            .get("data")
            .and_then(|d| d.get("data"))
            .and_then(|d| d.as_array())
            .ok_or(SyncError::InvalidBody("missing data.data array"))?
            .len();

        info!(images, "BDS sync completed");
        metrics::counter!("rider_bds_sync_total", "result" => "ok").increment(1);

        Ok(SyncReport {
            enabled: true,
            images,
            synced_at: Utc::now(),
        })
    }

    /// Run the sync on its interval; `None` when disabled
    pub fn spawn(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.enabled {
            info!("BDS sync is disabled; scheduler not started");
            return None;
        }

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // First tick completes immediately; the first pass waits a full interval
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    metrics::counter!("rider_bds_sync_total", "result" => "err").increment(1);
                    error!(error = %e, "BDS sync failed");
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sync(url: &str, enabled: bool) -> BdsSync {
        BdsSync::new(&BdsConfig {
            enabled,
            api_url: format!("{url}/"),
            interval: Duration::from_secs(60),
        })
    }

    #[tokio::test]
    async fn test_disabled_does_not_call_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let report = sync(&server.uri(), false).run_once().await.unwrap();
        assert!(!report.enabled);
        assert_eq!(report.images, 0);
        assert!(Arc::new(sync(&server.uri(), false)).spawn().is_none());
    }

    #[tokio::test]
    async fn test_counts_images() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/images"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "data": [{ "id": 1 }, { "id": 2 }, { "id": 3 }] }
            })))
            .mount(&server)
            .await;

        let report = sync(&server.uri(), true).run_once().await.unwrap();
        assert!(report.enabled);
        assert_eq!(report.images, 3);
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/images"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = sync(&server.uri(), true).run_once().await.unwrap_err();
        assert!(matches!(err, SyncError::Status(503)));
    }

    #[tokio::test]
    async fn test_unexpected_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/images"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "items": [] })))
            .mount(&server)
            .await;

        let err = sync(&server.uri(), true).run_once().await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidBody(_)));
    }
}
