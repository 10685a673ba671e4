//! Access token issuing and validation (HS256 JWT)

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{AuthConfig, AuthError};

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Email at the time of issue
    pub email: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Token id; makes two tokens issued in the same second distinct
    pub jti: String,
}

impl Claims {
    /// Parse the subject as a user id
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)
    }
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and validates access tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            ttl: chrono::Duration::from_std(config.token_ttl)
                .unwrap_or_else(|_| chrono::Duration::days(7)),
        }
    }

    /// Issue a token for a user
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate signature and expiry and return the claims
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    tracing::debug!(error = %e, "Token rejected");
                    AuthError::InvalidToken
                }
            })
    }
}

/// Hex SHA-256 of a token, as stored on the user row
pub fn token_fingerprint(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Constant-time check of a token against a stored fingerprint
pub fn fingerprint_matches(token: &str, stored: &str) -> bool {
    let computed = token_fingerprint(token);
    computed.as_bytes().ct_eq(stored.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&AuthConfig::new("test-secret"))
    }

    #[test]
    fn test_issue_and_validate() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();
        let issued = issuer.issue(user_id, "a@example.com").unwrap();

        let claims = issuer.validate(&issued.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = issuer().issue(Uuid::new_v4(), "a@example.com").unwrap();
        let other = TokenIssuer::new(&AuthConfig::new("other-secret"));
        assert!(matches!(
            other.validate(&issued.token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token() {
        let config = AuthConfig::new("test-secret");
        let issuer = TokenIssuer::new(&config);
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "a@example.com".to_string(),
            iat: Utc::now().timestamp() - 120,
            exp: Utc::now().timestamp() - 60,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(issuer.validate(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            issuer().validate("not.a.jwt"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_custom_ttl() {
        let issuer = TokenIssuer::new(
            &AuthConfig::new("test-secret").with_token_ttl(Duration::from_secs(60)),
        );
        let issued = issuer.issue(Uuid::new_v4(), "a@example.com").unwrap();
        let remaining = issued.expires_at - Utc::now();
        assert!(remaining <= chrono::Duration::seconds(60));
        assert!(remaining > chrono::Duration::seconds(50));
    }

    #[test]
    fn test_two_tokens_differ() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();
        let a = issuer.issue(user_id, "a@example.com").unwrap();
        let b = issuer.issue(user_id, "a@example.com").unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_fingerprint() {
        let fp = token_fingerprint("abc");
        assert_eq!(fp.len(), 64);
        assert!(fingerprint_matches("abc", &fp));
        assert!(!fingerprint_matches("abd", &fp));
        assert!(!fingerprint_matches("abc", "short"));
    }
}
