//! User accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use adburst_core::{Email, SubscriptionTier, UserId};

/// A user account.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub display_name: Option<String>,
    /// Remaining generation credits; never negative.
    pub credits: i32,
    pub tier: SubscriptionTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the account can pay for one generation at `cost`.
    #[must_use]
    pub const fn can_afford(&self, cost: i32) -> bool {
        self.credits >= cost
    }
}
