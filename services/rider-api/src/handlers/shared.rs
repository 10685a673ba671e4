//! Shared handler utilities
//!
//! Common validation, access checks and metrics used across handlers.

use std::time::Instant;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use rider_db::{GrantRow, RiderRepository, RiderRow};
use rider_types::Action;

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthUser;
use crate::state::AppState;

// ============================================================================
// Input Validation
// ============================================================================

/// Maximum length for names and titles
pub const MAX_NAME_LEN: usize = 255;

/// Trimmed value of a required text field
pub fn require_text(value: Option<&str>, field_name: &str) -> Result<String, ApiError> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{field_name} is required")));
    }
    Ok(trimmed.to_string())
}

/// Required name field, bounded in length
pub fn require_name(value: Option<&str>, field_name: &str) -> Result<String, ApiError> {
    let name = require_text(value, field_name)?;
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::Validation(format!(
            "{field_name} too long (max {MAX_NAME_LEN} chars)"
        )));
    }
    Ok(name)
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================================================
// Access Checks
// ============================================================================

/// Load a rider or fail with 404
pub async fn load_rider(state: &AppState, rider_id: Uuid) -> ApiResult<RiderRow> {
    state
        .repos
        .riders
        .find_by_id(rider_id)
        .await?
        .ok_or(ApiError::NotFound("Rider"))
}

/// Fail with 403 unless the user may perform `action` on the rider
pub async fn require_rider_access(
    state: &AppState,
    rider: &RiderRow,
    user: &AuthUser,
    action: Action,
) -> ApiResult<()> {
    require_rider_access_with(state, rider, user, action, None).await
}

/// [`require_rider_access`] with the rider's grants already in hand
pub async fn require_rider_access_with(
    state: &AppState,
    rider: &RiderRow,
    user: &AuthUser,
    action: Action,
    rider_grants: Option<&[GrantRow]>,
) -> ApiResult<()> {
    if state
        .resolver
        .can_with_grants(rider, &user.email, action, rider_grants)
        .await?
    {
        return Ok(());
    }
    metrics::counter!("rider_permission_denials_total", "action" => action.as_str()).increment(1);
    Err(ApiError::Forbidden(match action {
        Action::View => "You do not have access to this rider",
        Action::Comment => "You do not have permission to comment on this rider",
        Action::Edit => "You do not have permission to edit this rider",
    }))
}

/// Fail with 403 unless the user owns the resource
pub fn require_owner(owner_id: Uuid, user: &AuthUser, message: &'static str) -> ApiResult<()> {
    if owner_id == user.id {
        Ok(())
    } else {
        Err(ApiError::Forbidden(message))
    }
}

/// Body returned by delete operations
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

impl DeletedResponse {
    pub const OK: Self = Self { deleted: true };
}

// ============================================================================
// Metrics Helpers
// ============================================================================

/// Record HTTP operation duration with result label.
///
/// Labels: operation, result (ok/err)
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "rider_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

// ============================================================================
// Tests
// ============================================================================
