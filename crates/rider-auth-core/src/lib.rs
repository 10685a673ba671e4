//! Rider Auth Core - Authentication and authorization logic
//!
//! - Account registration, login and token validation ([`AuthService`])
//! - Rider sharing decisions ([`PermissionResolver`])
//! - Plan rider quotas ([`RiderQuota`], [`QuotaEnforcer`])
//! - Grant management ([`GrantManager`])

pub mod config;
pub mod error;
pub mod password;
pub mod permission;
pub mod quota;
pub mod service;
pub mod sharing;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use permission::{resolve_access, PermissionResolver};
pub use quota::{can_create_resource, QuotaEnforcer, RiderQuota};
pub use service::{AuthService, AuthSession, RegisterInput};
pub use sharing::GrantManager;
pub use token::{fingerprint_matches, token_fingerprint, Claims, IssuedToken, TokenIssuer};
