//! Stripe webhook handler

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use super::shared::record_op_duration;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// POST /webhook/stripe
///
/// Verifies the signature over the raw body before anything is parsed.
/// Rejected deliveries get 400; store failures get 500 so the provider
/// retries; everything else, including events that matched nothing, is
/// acknowledged with 200.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let start = Instant::now();

    let Some(signature) = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!("Missing or unreadable Stripe-Signature header");
        metrics::counter!("rider_webhooks_processed_total", "status" => "rejected").increment(1);
        return Err(ApiError::SignatureInvalid);
    };

    let result = state.billing.handle_webhook(&body, signature).await;
    record_op_duration("process_webhook", start, result.is_ok());

    match result {
        Ok(outcome) => {
            metrics::counter!("rider_webhooks_processed_total", "status" => outcome.as_str())
                .increment(1);
            Ok(Json(WebhookAck { received: true }))
        }
        Err(e) => {
            let status = if e.is_rejected_delivery() { "rejected" } else { "error" };
            metrics::counter!("rider_webhooks_processed_total", "status" => status).increment(1);
            tracing::warn!(error = %e, "Webhook delivery not applied");
            Err(e.into())
        }
    }
}
