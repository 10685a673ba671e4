//! Error types for the rider API service.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use rider_auth_core::AuthError;
use rider_billing_core::BillingError;
use rider_db::DbError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is not active")]
    AccountSuspended,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("An active subscription is required")]
    SubscriptionRequired,

    #[error("Rider limit reached for your plan ({max_riders} riders)")]
    LimitExceeded { max_riders: i32 },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Too many requests, please try again later")]
    RateLimited { retry_after_secs: u64 },

    #[error("Webhook signature verification failed")]
    SignatureInvalid,

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error")]
    Database(#[source] DbError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::SignatureInvalid => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AccountSuspended | Self::Forbidden(_) | Self::SubscriptionRequired
            | Self::LimitExceeded { .. } => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountSuspended => "ACCOUNT_SUSPENDED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::SubscriptionRequired => "SUBSCRIPTION_REQUIRED",
            Self::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            Self::SignatureInvalid => "SIGNATURE_INVALID",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Internal(_) | Self::Database(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::LimitExceeded { max_riders } => Some(json!({ "max_riders": max_riders })),
            Self::RateLimited { retry_after_secs } => {
                Some(json!({ "retry_after_secs": retry_after_secs }))
            }
            _ => None,
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_) | Self::Database(_))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log internal errors; their messages stay out of the body
        let message = if self.is_internal() {
            tracing::error!(error = ?self, "Internal API error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message,
                details: self.details(),
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Self::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => Self::NotFound("Record"),
            DbError::Conflict => Self::Conflict("Record already exists".to_string()),
            other => Self::Database(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken | AuthError::TokenExpired | AuthError::TokenRevoked => {
                Self::Unauthorized
            }
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::AccountSuspended => Self::AccountSuspended,
            AuthError::UserNotFound => Self::NotFound("User"),
            AuthError::EmailTaken => Self::Conflict("Email is already registered".to_string()),
            AuthError::Validation(msg) => Self::Validation(msg),
            AuthError::SubscriptionRequired => Self::SubscriptionRequired,
            AuthError::LimitExceeded { max_riders } => Self::LimitExceeded { max_riders },
            AuthError::AlreadyShared { scope, email } => {
                Self::Conflict(format!("This {scope} is already shared with {email}"))
            }
            AuthError::GrantNotFound => Self::NotFound("Permission"),
            AuthError::Database(msg) | AuthError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::PlanNotFound => Self::NotFound("Subscription type"),
            BillingError::PlanNotPurchasable => {
                Self::Validation("Subscription type cannot be purchased".to_string())
            }
            BillingError::SignatureInvalid(_) => Self::SignatureInvalid,
            BillingError::InvalidPayload(msg) => Self::Validation(msg),
            BillingError::ProviderError(msg) => Self::Upstream(msg),
            BillingError::Database(e) => Self::Database(e),
            BillingError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rider_types::GrantScope;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value, Option<String>) {
        let response = err.into_response();
        let status = response.status();
        let retry = response
            .headers()
            .get(header::RETRY_AFTER)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap(), retry)
    }

    #[tokio::test]
    async fn test_limit_exceeded_carries_quota() {
        let (status, body, _) = body_json(ApiError::LimitExceeded { max_riders: 1 }).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "LIMIT_EXCEEDED");
        assert_eq!(body["error"]["details"]["max_riders"], 1);
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let (status, body, retry) =
            body_json(ApiError::RateLimited { retry_after_secs: 42 }).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");
        assert_eq!(retry.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_internal_message_hidden() {
        let (status, body, _) = body_json(ApiError::Internal("pool exhausted".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "Internal server error");
        assert!(body["error"].get("details").is_none());
    }

    #[test]
    fn test_auth_error_mapping() {
        assert!(matches!(ApiError::from(AuthError::TokenRevoked), ApiError::Unauthorized));
        assert_eq!(
            ApiError::from(AuthError::EmailTaken).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(AuthError::SubscriptionRequired).error_code(),
            "SUBSCRIPTION_REQUIRED"
        );
        assert!(matches!(
            ApiError::from(AuthError::LimitExceeded { max_riders: 1 }),
            ApiError::LimitExceeded { max_riders: 1 }
        ));
        let shared = ApiError::from(AuthError::AlreadyShared {
            scope: GrantScope::Rider,
            email: "guest@example.com".to_string(),
        });
        assert_eq!(shared.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            shared.to_string(),
            "This rider is already shared with guest@example.com"
        );
    }

    #[test]
    fn test_billing_error_mapping() {
        assert_eq!(
            ApiError::from(BillingError::SignatureInvalid("bad".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(BillingError::PlanNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(BillingError::Database(DbError::InvalidData("x".into()))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_db_conflict_is_409() {
        assert_eq!(ApiError::from(DbError::Conflict).status_code(), StatusCode::CONFLICT);
    }
}
