//! Sharing grant operations common to riders and projects

use serde::Deserialize;
use uuid::Uuid;

use rider_db::GrantRow;
use rider_types::{normalize_email, GrantScope, Permission};

use super::shared::require_text;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateGrantRequest {
    pub email: Option<String>,
    pub permission: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGrantRequest {
    pub permission: Option<String>,
}

fn parse_permission(scope: GrantScope, raw: Option<&str>) -> ApiResult<Permission> {
    let raw = require_text(raw, "permission")?;
    Permission::parse_for(scope, &raw).map_err(|_| {
        let allowed: Vec<&str> = scope.allowed().iter().map(Permission::as_str).collect();
        ApiError::Validation(format!(
            "permission must be one of: {}",
            allowed.join(", ")
        ))
    })
}

pub(super) async fn add(
    state: &AppState,
    scope: GrantScope,
    resource_id: Uuid,
    req: CreateGrantRequest,
) -> ApiResult<GrantRow> {
    let email = normalize_email(&require_text(req.email.as_deref(), "email")?);
    if !email.contains('@') {
        return Err(ApiError::Validation("email is not valid".to_string()));
    }
    let permission = parse_permission(scope, req.permission.as_deref())?;

    Ok(state.sharing.share(scope, resource_id, &email, permission).await?)
}

pub(super) async fn change(
    state: &AppState,
    scope: GrantScope,
    resource_id: Uuid,
    grant_id: Uuid,
    req: UpdateGrantRequest,
) -> ApiResult<GrantRow> {
    let permission = parse_permission(scope, req.permission.as_deref())?;
    Ok(state
        .sharing
        .change(scope, resource_id, grant_id, permission)
        .await?)
}

pub(super) async fn remove(
    state: &AppState,
    scope: GrantScope,
    resource_id: Uuid,
    grant_id: Uuid,
) -> ApiResult<()> {
    Ok(state.sharing.revoke(scope, resource_id, grant_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rider_grants_reject_read() {
        let err = parse_permission(GrantScope::Rider, Some("read")).unwrap_err();
        assert_eq!(err.to_string(), "permission must be one of: comment, edit");
    }

    #[test]
    fn test_project_grants_accept_read() {
        assert_eq!(
            parse_permission(GrantScope::Project, Some(" read ")).unwrap(),
            Permission::Read
        );
    }

    #[test]
    fn test_missing_permission() {
        assert!(matches!(
            parse_permission(GrantScope::Project, None),
            Err(ApiError::Validation(_))
        ));
    }
}
