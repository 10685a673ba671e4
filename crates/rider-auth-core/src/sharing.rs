//! Grant management for riders and projects
//!
//! A resource holds at most one grant per email. Grants are addressed by
//! (scope, resource, grant id) so an id belonging to another resource is
//! treated as missing.

use std::sync::Arc;

use rider_db::{DbError, GrantRepository, GrantRow};
use rider_types::{normalize_email, GrantScope, Permission};
use tracing::info;
use uuid::Uuid;

use crate::AuthError;

/// Creates, changes and revokes sharing grants
pub struct GrantManager<G: GrantRepository> {
    grants: Arc<G>,
}

impl<G: GrantRepository> Clone for GrantManager<G> {
    fn clone(&self) -> Self {
        Self {
            grants: self.grants.clone(),
        }
    }
}

impl<G: GrantRepository> GrantManager<G> {
    pub fn new(grants: Arc<G>) -> Self {
        Self { grants }
    }

    /// Share a resource with `email`
    pub async fn share(
        &self,
        scope: GrantScope,
        resource_id: Uuid,
        email: &str,
        permission: Permission,
    ) -> Result<GrantRow, AuthError> {
        if !scope.allows(permission) {
            return Err(AuthError::Validation(format!(
                "{permission} cannot be granted on a {scope}"
            )));
        }

        let email = normalize_email(email);
        let grant = match self
            .grants
            .create(scope, resource_id, &email, permission)
            .await
        {
            Ok(grant) => grant,
            Err(DbError::Conflict) => return Err(AuthError::AlreadyShared { scope, email }),
            Err(e) => return Err(e.into()),
        };

        info!(%scope, resource_id = %resource_id, grant_id = %grant.id, %permission, "Grant created");
        Ok(grant)
    }

    /// Change the level of an existing grant
    pub async fn change(
        &self,
        scope: GrantScope,
        resource_id: Uuid,
        grant_id: Uuid,
        permission: Permission,
    ) -> Result<GrantRow, AuthError> {
        if !scope.allows(permission) {
            return Err(AuthError::Validation(format!(
                "{permission} cannot be granted on a {scope}"
            )));
        }

        self.grants
            .update_permission(scope, resource_id, grant_id, permission)
            .await?
            .ok_or(AuthError::GrantNotFound)
    }

    pub async fn revoke(
        &self,
        scope: GrantScope,
        resource_id: Uuid,
        grant_id: Uuid,
    ) -> Result<(), AuthError> {
        if self.grants.delete(scope, resource_id, grant_id).await? {
            info!(%scope, resource_id = %resource_id, grant_id = %grant_id, "Grant revoked");
            Ok(())
        } else {
            Err(AuthError::GrantNotFound)
        }
    }
}
