//! Account service: registration, login, token authentication and logout

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use rider_db::{CreateUser, DbError, PlanRepository, UserRepository, UserRow};
use rider_types::{normalize_email, UserStatus};

use crate::password::{hash_password, verify_password};
use crate::token::{fingerprint_matches, token_fingerprint, TokenIssuer};
use crate::{AuthConfig, AuthError};

/// Registration input
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub contact_phone: Option<String>,
}

/// A signed-in user and their access token
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: UserRow,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Account service
pub struct AuthService<U: UserRepository, P: PlanRepository> {
    users: Arc<U>,
    plans: Arc<P>,
    tokens: TokenIssuer,
    config: AuthConfig,
}

impl<U: UserRepository, P: PlanRepository> AuthService<U, P> {
    pub fn new(users: Arc<U>, plans: Arc<P>, config: AuthConfig) -> Self {
        Self {
            users,
            plans,
            tokens: TokenIssuer::new(&config),
            config,
        }
    }

    /// Create an active account subscribed to the default plan and sign it in
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, AuthError> {
        let name = input.name.trim();
        let email = normalize_email(&input.email);
        if name.is_empty() || email.is_empty() || input.password.is_empty() {
            return Err(AuthError::Validation(
                "name, email and password are required".to_string(),
            ));
        }
        if !looks_like_email(&email) {
            return Err(AuthError::Validation("email is not valid".to_string()));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let default_plan = self.plans.find_by_name(&self.config.default_plan).await?;
        if default_plan.is_none() {
            warn!(plan = %self.config.default_plan, "Default plan missing; registering without subscription");
        }

        let user = self
            .users
            .create(CreateUser {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email,
                password_hash: hash_password(&input.password)?,
                contact_phone: input.contact_phone.filter(|p| !p.trim().is_empty()),
                status: UserStatus::Active.as_str().to_string(),
                default_plan_id: default_plan.map(|p| p.id),
            })
            .await
            .map_err(|e| match e {
                DbError::Conflict => AuthError::EmailTaken,
                other => AuthError::from(other),
            })?;

        info!(user_id = %user.id, "User registered");

        self.start_session(user).await
    }

    /// Check credentials and issue a new token, revoking the previous one
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.status()?.can_sign_in() {
            return Err(AuthError::AccountSuspended);
        }

        self.start_session(user).await
    }

    /// Resolve a bearer token to its active user
    pub async fn authenticate(&self, token: &str) -> Result<UserRow, AuthError> {
        let claims = self.tokens.validate(token)?;
        let user = self
            .users
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.status()?.can_sign_in() {
            return Err(AuthError::AccountSuspended);
        }

        match user.token_hash.as_deref() {
            Some(stored) if fingerprint_matches(token, stored) => Ok(user),
            _ => Err(AuthError::TokenRevoked),
        }
    }

    /// Revoke the user's current token
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AuthError> {
        self.users.set_token_hash(user_id, None).await?;
        info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    async fn start_session(&self, user: UserRow) -> Result<AuthSession, AuthError> {
        let issued = self.tokens.issue(user.id, &user.email)?;
        let fingerprint = token_fingerprint(&issued.token);
        self.users
            .set_token_hash(user.id, Some(&fingerprint))
            .await?;

        Ok(AuthSession {
            user: UserRow {
                token_hash: Some(fingerprint),
                ..user
            },
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("a@example.com"));
        assert!(!looks_like_email("example.com"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("a@localhost"));
        assert!(!looks_like_email("a@.com"));
    }
}
