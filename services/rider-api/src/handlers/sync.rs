//! Manual BDS sync trigger

use axum::extract::State;
use axum::Json;

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::state::AppState;
use crate::sync::SyncReport;

/// POST /sync/refresh
pub async fn refresh(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<SyncReport>> {
    tracing::info!(user_id = %user.id, "Manual BDS sync requested");
    let report = state.bds.run_once().await.map_err(|e| {
        metrics::counter!("rider_bds_sync_total", "result" => "err").increment(1);
        ApiError::Upstream(e.to_string())
    })?;
    Ok(Json(report))
}
