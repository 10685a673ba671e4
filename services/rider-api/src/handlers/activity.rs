//! Activity log and favorites handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use rider_db::{ActivityRepository, ActivityRow, FavoriteRepository, FavoriteRow};

use super::shared::{require_name, require_owner, DeletedResponse};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::state::AppState;

/// Default number of activity entries returned
pub const DEFAULT_ACTIVITY_LIMIT: i64 = 50;
/// Maximum number of activity entries returned
pub const MAX_ACTIVITY_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

impl ActivityQuery {
    fn effective_limit(&self) -> i64 {
        self.limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
            .min(MAX_ACTIVITY_LIMIT)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateFavoriteRequest {
    pub name: Option<String>,
    pub data: Option<serde_json::Value>,
}

/// GET /user/activities
pub async fn list_activities(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ActivityQuery>,
) -> ApiResult<Json<Vec<ActivityRow>>> {
    let entries = state
        .repos
        .activities
        .list_for_user(user.id, query.effective_limit())
        .await?;
    Ok(Json(entries))
}

/// GET /user/favorites
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<FavoriteRow>>> {
    Ok(Json(state.repos.favorites.list_for_user(user.id).await?))
}

/// POST /user/favorites
pub async fn create_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateFavoriteRequest>,
) -> ApiResult<(StatusCode, Json<FavoriteRow>)> {
    let name = require_name(req.name.as_deref(), "name")?;
    let data = req
        .data
        .filter(|d| !d.is_null())
        .ok_or_else(|| ApiError::Validation("data is required".to_string()))?;

    let favorite = state.repos.favorites.create(user.id, &name, data).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

/// DELETE /user/favorites/{id}
pub async fn delete_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DeletedResponse>> {
    let favorite = state
        .repos
        .favorites
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Favorite"))?;
    require_owner(favorite.user_id, &user, "This favorite belongs to another user")?;

    if !state.repos.favorites.delete(id).await? {
        return Err(ApiError::NotFound("Favorite"));
    }
    Ok(Json(DeletedResponse::OK))
}
