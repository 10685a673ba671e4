//! Rider handlers: CRUD, quota enforcement and rider sharing

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rider_auth_core::AuthError;
use rider_db::{
    CreateRider, GrantRepository, GrantRow, NewActivity, ProjectRepository, RiderRepository,
    RiderRow, UpdateRider,
};
use rider_types::{Action, GrantScope};

use super::grants::{self, CreateGrantRequest, UpdateGrantRequest};
use super::shared::{
    double_option, load_rider, record_op_duration, require_name, require_owner,
    require_rider_access, require_rider_access_with, DeletedResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::state::AppState;

const NOT_OWNER: &str = "Only the rider owner can do this";

#[derive(Debug, Deserialize)]
pub struct ListRidersQuery {
    #[serde(alias = "projectId")]
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRiderRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub data: Option<serde_json::Value>,
    #[serde(alias = "projectId")]
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRiderRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub data: Option<Option<serde_json::Value>>,
    #[serde(default, alias = "projectId", deserialize_with = "double_option")]
    pub project_id: Option<Option<Uuid>>,
}

#[derive(Debug, Serialize)]
pub struct RiderView {
    #[serde(flatten)]
    pub rider: RiderRow,
    pub permissions: Vec<GrantRow>,
}

/// Fail unless the project exists and belongs to the user
async fn require_own_project(state: &AppState, project_id: Uuid, user: &AuthUser) -> ApiResult<()> {
    match state.repos.projects.find_by_id(project_id).await? {
        Some(project) if project.user_id == user.id => Ok(()),
        _ => Err(ApiError::Validation(
            "Invalid project or access denied".to_string(),
        )),
    }
}

/// GET /riders
pub async fn list_riders(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ListRidersQuery>,
) -> ApiResult<Json<Vec<RiderRow>>> {
    let riders = state
        .repos
        .riders
        .list_by_owner(user.id, query.project_id)
        .await?;
    Ok(Json(riders))
}

/// GET /riders/{id}
pub async fn get_rider(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<RiderView>> {
    let rider = load_rider(&state, id).await?;
    let permissions = state.repos.grants.list(GrantScope::Rider, id).await?;
    require_rider_access_with(&state, &rider, &user, Action::View, Some(permissions.as_slice()))
        .await?;
    Ok(Json(RiderView { rider, permissions }))
}

/// POST /riders
///
/// Requires an active subscription; the plan's rider quota is checked and
/// the rider inserted in one store transaction.
pub async fn create_rider(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateRiderRequest>,
) -> ApiResult<(StatusCode, Json<RiderRow>)> {
    let start = Instant::now();
    let result = create_rider_inner(&state, &user, req).await;
    record_op_duration("create_rider", start, result.is_ok());
    Ok((StatusCode::CREATED, Json(result?)))
}

async fn create_rider_inner(
    state: &AppState,
    user: &AuthUser,
    req: CreateRiderRequest,
) -> ApiResult<RiderRow> {
    let name = require_name(req.name.as_deref(), "name")?;
    let quota = state.quota.quota_for(user.id).await?;

    if let Some(project_id) = req.project_id {
        require_own_project(state, project_id, user).await?;
    }

    let activity = NewActivity::new("Rider Created", format!("Created rider: {name}"));
    let created = state
        .quota
        .create_rider(
            quota,
            CreateRider {
                id: Uuid::new_v4(),
                owner_id: user.id,
                project_id: req.project_id,
                name,
                description: req.description,
                data: req.data,
                activity,
            },
        )
        .await;

    match created {
        Ok(rider) => {
            tracing::info!(rider_id = %rider.id, user_id = %user.id, "Rider created");
            Ok(rider)
        }
        Err(AuthError::LimitExceeded { max_riders }) => {
            metrics::counter!("rider_quota_rejections_total").increment(1);
            Err(ApiError::LimitExceeded { max_riders })
        }
        Err(e) => Err(e.into()),
    }
}

/// PUT /riders/{id}
pub async fn update_rider(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateRiderRequest>,
) -> ApiResult<Json<RiderRow>> {
    let rider = load_rider(&state, id).await?;
    require_rider_access(&state, &rider, &user, Action::Edit).await?;

    let name = match req.name.as_deref() {
        Some(raw) => Some(require_name(Some(raw), "name")?),
        None => None,
    };

    if let Some(Some(project_id)) = req.project_id {
        require_own_project(&state, project_id, &user).await?;
    }

    let display_name = name.clone().unwrap_or_else(|| rider.name.clone());
    let updated = state
        .repos
        .riders
        .update(
            id,
            UpdateRider {
                name,
                description: req.description,
                data: req.data,
                project_id: req.project_id,
                actor_id: user.id,
            },
            NewActivity::new("Rider Updated", format!("Updated rider: {display_name}")),
        )
        .await?
        .ok_or(ApiError::NotFound("Rider"))?;

    Ok(Json(updated))
}

/// DELETE /riders/{id}
pub async fn delete_rider(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DeletedResponse>> {
    let rider = load_rider(&state, id).await?;
    require_owner(rider.owner_id, &user, NOT_OWNER)?;

    let activity = NewActivity::new("Rider Deleted", format!("Deleted rider: {}", rider.name));
    if !state.repos.riders.delete(id, user.id, activity).await? {
        return Err(ApiError::NotFound("Rider"));
    }
    tracing::info!(rider_id = %id, user_id = %user.id, "Rider deleted");
    Ok(Json(DeletedResponse::OK))
}

/// POST /riders/{id}/permissions
pub async fn add_rider_permission(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CreateGrantRequest>,
) -> ApiResult<(StatusCode, Json<GrantRow>)> {
    let rider = load_rider(&state, id).await?;
    require_owner(rider.owner_id, &user, NOT_OWNER)?;
    let grant = grants::add(&state, GrantScope::Rider, id, req).await?;
    Ok((StatusCode::CREATED, Json(grant)))
}

/// PUT /riders/{id}/permissions/{pid}
pub async fn update_rider_permission(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((id, grant_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<UpdateGrantRequest>,
) -> ApiResult<Json<GrantRow>> {
    let rider = load_rider(&state, id).await?;
    require_owner(rider.owner_id, &user, NOT_OWNER)?;
    let grant = grants::change(&state, GrantScope::Rider, id, grant_id, req).await?;
    Ok(Json(grant))
}

/// DELETE /riders/{id}/permissions/{pid}
pub async fn delete_rider_permission(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((id, grant_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<DeletedResponse>> {
    let rider = load_rider(&state, id).await?;
    require_owner(rider.owner_id, &user, NOT_OWNER)?;
    grants::remove(&state, GrantScope::Rider, id, grant_id).await?;
    Ok(Json(DeletedResponse::OK))
}
