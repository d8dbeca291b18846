//! Credit ledger entries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use adburst_core::{CreationId, CreditTransactionId, SubscriptionTier, UserId};

/// One signed change to a user's credit balance.
#[derive(Debug, Clone, Serialize)]
pub struct CreditTransaction {
    pub id: CreditTransactionId,
    pub user_id: UserId,
    pub delta: i32,
    pub reason: String,
    pub creation_id: Option<CreationId>,
    pub created_at: DateTime<Utc>,
}

/// Response body of `GET /api/credits`.
#[derive(Debug, Clone, Serialize)]
pub struct CreditSummary {
    pub credits: i32,
    pub tier: SubscriptionTier,
    pub max_variations: usize,
    pub generation_cost: i32,
    pub transactions: Vec<CreditTransaction>,
}
