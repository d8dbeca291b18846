//! Account management: credit grants and plan changes.
//!
//! ```bash
//! adburst credits grant -e ada@example.com -a 50 -r "support refund"
//! adburst tier set -e ada@example.com -t pro
//! ```

use adburst_core::{Email, SubscriptionTier};
use adburst_server::db::{CreditRepository, RepositoryError, UserRepository};

use super::{CommandError, connect};

fn parse_email(email: &str) -> Result<Email, CommandError> {
    Email::parse(email).map_err(|e| CommandError::Invalid(format!("Invalid email: {e}")))
}

/// Add (or with a negative amount, remove) credits and return the new balance.
pub async fn grant_credits(email: &str, amount: i32, reason: &str) -> Result<i32, CommandError> {
    let email = parse_email(email)?;
    if amount == 0 {
        return Err(CommandError::Invalid("amount must not be zero".to_string()));
    }

    let pool = connect().await?;
    let user = UserRepository::new(&pool)
        .get_by_email(&email)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    let balance = CreditRepository::new(&pool)
        .adjust(user.id, amount, reason)
        .await?;
    tracing::info!(user_id = %user.id, amount, balance, "Credits adjusted");
    Ok(balance)
}

/// Move a user to another subscription tier.
pub async fn set_tier(email: &str, tier: &str) -> Result<SubscriptionTier, CommandError> {
    let email = parse_email(email)?;
    let tier: SubscriptionTier = tier
        .parse()
        .map_err(|e: adburst_core::InvalidVariant| CommandError::Invalid(e.to_string()))?;

    let pool = connect().await?;
    let user = UserRepository::new(&pool).set_tier(&email, tier).await?;
    tracing::info!(user_id = %user.id, tier = %user.tier, "Tier updated");
    Ok(user.tier)
}
