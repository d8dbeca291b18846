//! User repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use adburst_core::{Email, SubscriptionTier, UserId};

use super::{RepositoryError, parse_column};
use crate::models::User;

const USER_COLUMNS: &str = "id, email, display_name, credits, tier, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    display_name: Option<String>,
    credits: i32,
    tier: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            email: parse_column("email", &row.email)?,
            display_name: row.display_name,
            credits: row.credits,
            tier: parse_column("tier", &row.tier)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM adburst.user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM adburst.user WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Find the user for a verified identity, creating the account on first sign-in.
    ///
    /// New accounts start with `signup_credits`, recorded in the credit ledger.
    /// Returns the user and whether it was created by this call.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_or_create(
        &self,
        email: &Email,
        display_name: Option<&str>,
        signup_credits: i32,
    ) -> Result<(User, bool), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // ON CONFLICT keeps concurrent first sign-ins from racing on the unique email.
        let inserted: Option<UserRow> = sqlx::query_as(&format!(
            r"
            INSERT INTO adburst.user (email, display_name, credits)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(email)
        .bind(display_name)
        .bind(signup_credits)
        .fetch_optional(&mut *tx)
        .await?;

        let (row, created) = if let Some(row) = inserted {
            if signup_credits > 0 {
                sqlx::query(
                    r"
                    INSERT INTO adburst.credit_transaction (user_id, delta, reason)
                    VALUES ($1, $2, 'signup')
                    ",
                )
                .bind(row.id)
                .bind(signup_credits)
                .execute(&mut *tx)
                .await?;
            }
            (row, true)
        } else {
            let row: UserRow = sqlx::query_as(&format!(
                r"
                UPDATE adburst.user
                SET display_name = COALESCE($2, display_name), updated_at = NOW()
                WHERE email = $1
                RETURNING {USER_COLUMNS}
                "
            ))
            .bind(email)
            .bind(display_name)
            .fetch_one(&mut *tx)
            .await?;
            (row, false)
        };

        tx.commit().await?;
        Ok((User::try_from(row)?, created))
    }

    /// Change a user's subscription tier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this email.
    pub async fn set_tier(
        &self,
        email: &Email,
        tier: SubscriptionTier,
    ) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE adburst.user
            SET tier = $2, updated_at = NOW()
            WHERE email = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(email)
        .bind(tier.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(email: &str, tier: &str) -> UserRow {
        let now = Utc::now();
        UserRow {
            id: UserId::new(7),
            email: email.to_string(),
            display_name: Some("Dana".to_string()),
            credits: 3,
            tier: tier.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_conversion() {
        let user = User::try_from(row("dana@example.com", "pro")).unwrap();
        assert_eq!(user.id, UserId::new(7));
        assert_eq!(user.email.as_str(), "dana@example.com");
        assert_eq!(user.tier, SubscriptionTier::Pro);
        assert!(user.can_afford(3));
        assert!(!user.can_afford(4));
    }

    #[test]
    fn test_row_conversion_rejects_bad_tier() {
        let err = User::try_from(row("dana@example.com", "platinum")).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
