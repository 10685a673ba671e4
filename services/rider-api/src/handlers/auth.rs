//! Account handlers: register, login, current user and logout

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rider_auth_core::{AuthSession, RegisterInput};
use rider_db::{CurrentSubscriptionRow, SubscriptionRepository, UserRow};

use super::shared::record_op_duration;
use crate::error::ApiResult;
use crate::extractors::{ApiJson, AuthUser};
use crate::state::AppState;

/// Public view of a user; never carries the password or token hash
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub contact_phone: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserView {
    fn from(user: UserRow) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            contact_phone: user.contact_phone,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserView,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<AuthSession> for SessionResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            user: session.user.into(),
            token: session.token,
            expires_at: session.expires_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "contactPhone")]
    pub contact_phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subscription: Option<CurrentSubscriptionRow>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let start = Instant::now();
    let result = state
        .auth
        .register(RegisterInput {
            name: req.name.unwrap_or_default(),
            email: req.email.unwrap_or_default(),
            password: req.password.unwrap_or_default(),
            contact_phone: req.contact_phone,
        })
        .await;
    record_op_duration("register", start, result.is_ok());

    let session = result?;
    metrics::counter!("rider_registrations_total").increment(1);
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let start = Instant::now();
    let result = state
        .auth
        .login(
            req.email.as_deref().unwrap_or_default(),
            req.password.as_deref().unwrap_or_default(),
        )
        .await;
    record_op_duration("login", start, result.is_ok());

    Ok(Json(result?.into()))
}

/// GET /auth/me
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<MeResponse>> {
    let subscription = state.repos.subscriptions.find_current_for_user(user.id).await?;
    Ok(Json(MeResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        subscription,
    }))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<LogoutResponse>> {
    state.auth.logout(user.id).await?;
    Ok(Json(LogoutResponse { success: true }))
}
