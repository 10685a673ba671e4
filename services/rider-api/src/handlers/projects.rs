//! Project handlers: CRUD plus project sharing

use std::collections::HashMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rider_db::{GrantRepository, GrantRow, ProjectRepository, ProjectRow, RiderRepository};
use rider_types::GrantScope;

use super::grants::{self, CreateGrantRequest, UpdateGrantRequest};
use super::shared::{require_name, require_owner, DeletedResponse};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, ApiPath, AuthUser};
use crate::state::AppState;

const NOT_OWNER: &str = "Only the project owner can do this";

#[derive(Debug, Deserialize)]
pub struct ProjectRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RiderSummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: ProjectRow,
    pub permissions: Vec<GrantRow>,
    pub riders: Vec<RiderSummary>,
}

async fn load_owned(state: &AppState, id: Uuid, user: &AuthUser) -> ApiResult<ProjectRow> {
    let project = state
        .repos
        .projects
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;
    require_owner(project.user_id, user, NOT_OWNER)?;
    Ok(project)
}

/// GET /projects
pub async fn list_projects(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<ProjectView>>> {
    let projects = state.repos.projects.list_by_owner(user.id).await?;
    let ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();

    let mut grants_by_project: HashMap<Uuid, Vec<GrantRow>> = HashMap::new();
    for grant in state
        .repos
        .grants
        .list_for_resources(GrantScope::Project, &ids)
        .await?
    {
        grants_by_project.entry(grant.resource_id).or_default().push(grant);
    }

    let mut riders_by_project: HashMap<Uuid, Vec<RiderSummary>> = HashMap::new();
    for rider in state.repos.riders.list_by_owner(user.id, None).await? {
        if let Some(project_id) = rider.project_id {
            riders_by_project.entry(project_id).or_default().push(RiderSummary {
                id: rider.id,
                name: rider.name,
            });
        }
    }

    let views = projects
        .into_iter()
        .map(|project| ProjectView {
            permissions: grants_by_project.remove(&project.id).unwrap_or_default(),
            riders: riders_by_project.remove(&project.id).unwrap_or_default(),
            project,
        })
        .collect();

    Ok(Json(views))
}

/// GET /projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ProjectView>> {
    let project = load_owned(&state, id, &user).await?;
    let permissions = state.repos.grants.list(GrantScope::Project, id).await?;
    let riders = state
        .repos
        .riders
        .list_by_owner(user.id, Some(id))
        .await?
        .into_iter()
        .map(|r| RiderSummary { id: r.id, name: r.name })
        .collect();

    Ok(Json(ProjectView {
        project,
        permissions,
        riders,
    }))
}

/// POST /projects
pub async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectRow>)> {
    let name = require_name(req.name.as_deref(), "name")?;
    let project = state.repos.projects.create(user.id, &name).await?;
    tracing::info!(project_id = %project.id, user_id = %user.id, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// PUT /projects/{id}
pub async fn update_project(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ProjectRequest>,
) -> ApiResult<Json<ProjectRow>> {
    let name = require_name(req.name.as_deref(), "name")?;
    load_owned(&state, id, &user).await?;
    let project = state
        .repos
        .projects
        .rename(id, &name)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;
    Ok(Json(project))
}

/// DELETE /projects/{id}
pub async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DeletedResponse>> {
    load_owned(&state, id, &user).await?;
    if !state.repos.projects.delete(id).await? {
        return Err(ApiError::NotFound("Project"));
    }
    tracing::info!(project_id = %id, user_id = %user.id, "Project deleted");
    Ok(Json(DeletedResponse::OK))
}

/// POST /projects/{id}/permissions
pub async fn add_project_permission(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CreateGrantRequest>,
) -> ApiResult<(StatusCode, Json<GrantRow>)> {
    load_owned(&state, id, &user).await?;
    let grant = grants::add(&state, GrantScope::Project, id, req).await?;
    Ok((StatusCode::CREATED, Json(grant)))
}

/// PUT /projects/{id}/permissions/{pid}
pub async fn update_project_permission(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((id, grant_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<UpdateGrantRequest>,
) -> ApiResult<Json<GrantRow>> {
    load_owned(&state, id, &user).await?;
    let grant = grants::change(&state, GrantScope::Project, id, grant_id, req).await?;
    Ok(Json(grant))
}

/// DELETE /projects/{id}/permissions/{pid}
pub async fn delete_project_permission(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((id, grant_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<DeletedResponse>> {
    load_owned(&state, id, &user).await?;
    grants::remove(&state, GrantScope::Project, id, grant_id).await?;
    Ok(Json(DeletedResponse::OK))
}
