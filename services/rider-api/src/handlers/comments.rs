//! Rider comment handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use rider_db::{CommentRepository, CommentRow, CreateComment, NewActivity, RiderRow, UpdateComment};
use rider_types::Action;

use super::shared::{load_rider, require_rider_access, require_text, DeletedResponse};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, ApiPath, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
    #[serde(alias = "positionXY", alias = "positionXy")]
    pub position_xy: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
    #[serde(alias = "positionXY", alias = "positionXy")]
    pub position_xy: Option<serde_json::Value>,
}

/// Load a comment that belongs to the rider, and check the user may change
/// it: only its author or the rider's owner may.
async fn load_modifiable(
    state: &AppState,
    rider: &RiderRow,
    comment_id: Uuid,
    user: &AuthUser,
) -> ApiResult<CommentRow> {
    let comment = state
        .repos
        .comments
        .find_by_id(comment_id)
        .await?
        .filter(|c| c.rider_id == rider.id)
        .ok_or(ApiError::NotFound("Comment"))?;

    if comment.user_id != user.id && rider.owner_id != user.id {
        return Err(ApiError::Forbidden(
            "Only the comment author or the rider owner can do this",
        ));
    }
    Ok(comment)
}

/// GET /riders/{id}/comments
pub async fn list_comments(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(rider_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<CommentRow>>> {
    let rider = load_rider(&state, rider_id).await?;
    require_rider_access(&state, &rider, &user, Action::View).await?;
    Ok(Json(state.repos.comments.list_for_rider(rider_id).await?))
}

/// POST /riders/{id}/comments
pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(rider_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentRow>)> {
    let content = require_text(req.content.as_deref(), "content")?;
    let rider = load_rider(&state, rider_id).await?;
    require_rider_access(&state, &rider, &user, Action::Comment).await?;

    let comment = state
        .repos
        .comments
        .create(
            CreateComment {
                id: Uuid::new_v4(),
                rider_id,
                user_id: user.id,
                title: req.title,
                content,
                status: req.status,
                position_xy: req.position_xy,
            },
            NewActivity::new("Comment Added", format!("Added comment on rider: {}", rider.name)),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// PUT /riders/{id}/comments/{cid}
pub async fn update_comment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((rider_id, comment_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<UpdateCommentRequest>,
) -> ApiResult<Json<CommentRow>> {
    let content = match req.content.as_deref() {
        Some(raw) => Some(require_text(Some(raw), "content")?),
        None => None,
    };

    let rider = load_rider(&state, rider_id).await?;
    load_modifiable(&state, &rider, comment_id, &user).await?;

    let comment = state
        .repos
        .comments
        .update(
            comment_id,
            UpdateComment {
                title: req.title,
                content,
                status: req.status,
                position_xy: req.position_xy,
            },
        )
        .await?
        .ok_or(ApiError::NotFound("Comment"))?;

    Ok(Json(comment))
}

/// DELETE /riders/{id}/comments/{cid}
pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((rider_id, comment_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<DeletedResponse>> {
    let rider = load_rider(&state, rider_id).await?;
    load_modifiable(&state, &rider, comment_id, &user).await?;

    if !state.repos.comments.delete(comment_id).await? {
        return Err(ApiError::NotFound("Comment"));
    }
    Ok(Json(DeletedResponse::OK))
}
