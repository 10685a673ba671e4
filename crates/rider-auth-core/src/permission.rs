//! Rider access resolution
//!
//! Decides whether a principal, identified by email, may act on a rider.
//! Access is granted by, in order:
//!
//! 1. ownership of the rider,
//! 2. a rider grant whose level is one of the required levels,
//! 3. a grant on the rider's project whose level is one of the required
//!    levels; a project `edit` grant also satisfies a requirement that
//!    includes `comment`.
//!
//! Every rider action needs at least `comment`, so a project `read` grant
//! alone never opens a rider.
//!
//! Nothing is cached and nothing is written.

use std::sync::Arc;

use rider_db::{GrantRepository, GrantRow, RiderRow, UserRepository};
use rider_types::{Action, GrantScope, Permission};
use tracing::{debug, warn};

use crate::AuthError;

/// Pure access decision over already-loaded facts
///
/// `rider_grants` and `project_grants` are the levels held by `grantee_email`
/// only; project grants are ignored by callers when the rider has no project.
pub fn resolve_access(
    owner_email: Option<&str>,
    grantee_email: &str,
    rider_grants: &[Permission],
    project_grants: &[Permission],
    required: &[Permission],
) -> bool {
    if owner_email.is_some_and(|owner| owner.eq_ignore_ascii_case(grantee_email)) {
        return true;
    }

    if rider_grants.iter().any(|level| required.contains(level)) {
        return true;
    }

    project_grants.iter().any(|level| project_grant_satisfies(*level, required))
}

fn project_grant_satisfies(level: Permission, required: &[Permission]) -> bool {
    required.contains(&level)
        || (level == Permission::Edit && required.contains(&Permission::Comment))
}

/// Resolves rider access against the store
pub struct PermissionResolver<U: UserRepository, G: GrantRepository> {
    users: Arc<U>,
    grants: Arc<G>,
}

impl<U: UserRepository, G: GrantRepository> Clone for PermissionResolver<U, G> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            grants: self.grants.clone(),
        }
    }
}

impl<U: UserRepository, G: GrantRepository> PermissionResolver<U, G> {
    pub fn new(users: Arc<U>, grants: Arc<G>) -> Self {
        Self { users, grants }
    }

    /// Whether `grantee_email` may perform `action` on the rider
    pub async fn can(
        &self,
        rider: &RiderRow,
        grantee_email: &str,
        action: Action,
    ) -> Result<bool, AuthError> {
        self.can_with_grants(rider, grantee_email, action, None).await
    }

    /// [`can`](Self::can) reusing the rider's grants when the caller has
    /// already loaded them
    pub async fn can_with_grants(
        &self,
        rider: &RiderRow,
        grantee_email: &str,
        action: Action,
        rider_grants: Option<&[GrantRow]>,
    ) -> Result<bool, AuthError> {
        let allowed = self
            .has_permission(rider, grantee_email, action.required(), rider_grants)
            .await?;
        if !allowed {
            debug!(rider_id = %rider.id, action = %action, "Rider access denied");
        }
        Ok(allowed)
    }

    /// Whether `grantee_email` holds any of `required` on the rider
    ///
    /// `preloaded` may carry the rider's grants when the caller already has
    /// them; they are filtered to `grantee_email` before use.
    pub async fn has_permission(
        &self,
        rider: &RiderRow,
        grantee_email: &str,
        required: &[Permission],
        preloaded: Option<&[GrantRow]>,
    ) -> Result<bool, AuthError> {
        let owner = self.users.find_by_id(rider.owner_id).await?;
        if resolve_access(
            owner.as_ref().map(|o| o.email.as_str()),
            grantee_email,
            &[],
            &[],
            required,
        ) {
            return Ok(true);
        }

        let rider_grants = match preloaded {
            Some(grants) => levels_for(grants.iter().filter(|g| g.resource_id == rider.id), grantee_email),
            None => {
                let fetched = self
                    .grants
                    .find_for_email(GrantScope::Rider, rider.id, grantee_email)
                    .await?;
                levels_for(fetched.iter(), grantee_email)
            }
        };
        if resolve_access(None, grantee_email, &rider_grants, &[], required) {
            return Ok(true);
        }

        let Some(project_id) = rider.project_id else {
            return Ok(false);
        };

        let fetched = self
            .grants
            .find_for_email(GrantScope::Project, project_id, grantee_email)
            .await?;
        let project_grants = levels_for(fetched.iter(), grantee_email);

        Ok(resolve_access(None, grantee_email, &[], &project_grants, required))
    }
}

/// Levels held by `email` among the grants; unreadable rows are skipped
fn levels_for<'a>(grants: impl Iterator<Item = &'a GrantRow>, email: &str) -> Vec<Permission> {
    grants
        .filter(|g| g.email.eq_ignore_ascii_case(email))
        .filter_map(|g| match g.permission() {
            Ok(level) => Some(level),
            Err(e) => {
                warn!(grant_id = %g.id, error = %e, "Skipping grant with unknown level");
                None
            }
        })
        .collect()
}
