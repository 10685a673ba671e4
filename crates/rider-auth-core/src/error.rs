//! Auth errors

use rider_types::GrantScope;
use thiserror::Error;

/// Authentication and authorization errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Invalid token (malformed, bad signature, etc.)
    #[error("invalid token")]
    InvalidToken,

    /// Token has expired
    #[error("token expired")]
    TokenExpired,

    /// Token was superseded by a newer login or revoked by logout
    #[error("token revoked")]
    TokenRevoked,

    /// User not found
    #[error("user not found")]
    UserNotFound,

    /// Invalid credentials (unknown email or wrong password)
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Account exists but is not active
    #[error("account is not active")]
    AccountSuspended,

    /// Email already registered
    #[error("email already registered")]
    EmailTaken,

    /// Missing or malformed input
    #[error("validation failed: {0}")]
    Validation(String),

    /// No active subscription
    #[error("active subscription required")]
    SubscriptionRequired,

    /// Plan rider quota is used up
    #[error("rider limit of {max_riders} reached")]
    LimitExceeded { max_riders: i32 },

    /// The resource already has a grant for this email
    #[error("this {scope} is already shared with {email}")]
    AlreadyShared { scope: GrantScope, email: String },

    /// Grant does not exist on the resource
    #[error("grant not found")]
    GrantNotFound,

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidToken
            | Self::TokenExpired
            | Self::TokenRevoked
            | Self::InvalidCredentials => 401,
            Self::AccountSuspended | Self::SubscriptionRequired | Self::LimitExceeded { .. } => 403,
            Self::UserNotFound | Self::GrantNotFound => 404,
            Self::EmailTaken | Self::AlreadyShared { .. } => 409,
            Self::Validation(_) => 400,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::UserNotFound | Self::GrantNotFound => "NOT_FOUND",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountSuspended => "ACCOUNT_SUSPENDED",
            Self::EmailTaken | Self::AlreadyShared { .. } => "CONFLICT",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::SubscriptionRequired => "SUBSCRIPTION_REQUIRED",
            Self::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            Self::Database(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<rider_db::DbError> for AuthError {
    fn from(err: rider_db::DbError) -> Self {
        tracing::error!("Database error: {}", err);
        Self::Database(err.to_string())
    }
}
