//! Subscription and transaction states

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Subscription status
///
/// A user's current subscription is the most recent `Active` one. Rows are
/// never deleted; they move between states as billing events arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    /// Superseded by a newer subscription
    Expired,
    /// A recurring payment failed
    Paused,
}

/// Billing events that move a subscription between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionEvent {
    /// A newer subscription was activated for the same user
    Superseded,
    /// A recurring invoice was paid
    PaymentSucceeded,
    /// A recurring invoice could not be collected
    PaymentFailed,
}

impl SubscriptionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Paused => "paused",
        }
    }

    /// State after applying a billing event
    ///
    /// A successful payment reactivates any row, including an expired one.
    pub const fn apply(self, event: SubscriptionEvent) -> Self {
        match event {
            SubscriptionEvent::Superseded => Self::Expired,
            SubscriptionEvent::PaymentSucceeded => Self::Active,
            SubscriptionEvent::PaymentFailed => Self::Paused,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "paused" => Ok(Self::Paused),
            other => Err(ParseError::new("subscription status", other)),
        }
    }
}

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Paid,
    Failed,
}

impl TransactionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            other => Err(ParseError::new("transaction status", other)),
        }
    }
}
