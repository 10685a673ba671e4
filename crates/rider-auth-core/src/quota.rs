//! Plan rider quotas

use std::sync::Arc;

use rider_db::{
    CreateRider, CurrentSubscriptionRow, RiderRepository, RiderRow, SubscriptionRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::AuthError;

/// Quota value meaning "no limit"
pub const UNLIMITED: i32 = 0;

/// Whether an owner holding `current_count` riders may create one more
pub fn can_create_resource(current_count: i64, max_allowed: i32) -> bool {
    max_allowed == UNLIMITED || current_count < i64::from(max_allowed)
}

/// Rider quota taken from a user's current subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiderQuota {
    pub max_riders: i32,
}

impl RiderQuota {
    /// Quota for the current subscription; no subscription is an error of
    /// its own, distinct from an exhausted quota.
    pub fn for_subscription(
        subscription: Option<&CurrentSubscriptionRow>,
    ) -> Result<Self, AuthError> {
        subscription
            .map(|sub| Self {
                max_riders: sub.max_riders_allowed,
            })
            .ok_or(AuthError::SubscriptionRequired)
    }

    pub fn allows(&self, current_count: i64) -> bool {
        can_create_resource(current_count, self.max_riders)
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_riders == UNLIMITED
    }
}

/// Creates riders within the owner's plan quota
pub struct QuotaEnforcer<S: SubscriptionRepository, R: RiderRepository> {
    subscriptions: Arc<S>,
    riders: Arc<R>,
}

impl<S: SubscriptionRepository, R: RiderRepository> Clone for QuotaEnforcer<S, R> {
    fn clone(&self) -> Self {
        Self {
            subscriptions: self.subscriptions.clone(),
            riders: self.riders.clone(),
        }
    }
}

impl<S: SubscriptionRepository, R: RiderRepository> QuotaEnforcer<S, R> {
    pub fn new(subscriptions: Arc<S>, riders: Arc<R>) -> Self {
        Self {
            subscriptions,
            riders,
        }
    }

    /// Quota of the user's current subscription
    pub async fn quota_for(&self, user_id: Uuid) -> Result<RiderQuota, AuthError> {
        let current = self.subscriptions.find_current_for_user(user_id).await?;
        RiderQuota::for_subscription(current.as_ref())
    }

    /// Insert the rider if the owner is still under `quota`
    ///
    /// The count and the insert happen in one store transaction, so two
    /// concurrent creates never both take the last slot.
    pub async fn create_rider(
        &self,
        quota: RiderQuota,
        rider: CreateRider,
    ) -> Result<RiderRow, AuthError> {
        let owner_id = rider.owner_id;
        let allow = move |count: i64| quota.allows(count);

        match self.riders.create_within_quota(rider, &allow).await? {
            Some(row) => Ok(row),
            None => {
                info!(user_id = %owner_id, max_riders = quota.max_riders, "Rider quota reached");
                Err(AuthError::LimitExceeded {
                    max_riders: quota.max_riders,
                })
            }
        }
    }
}
