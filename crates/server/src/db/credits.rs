//! Credit ledger repository.
//!
//! The balance on `adburst.user` and the rows in `adburst.credit_transaction`
//! always change together inside one transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use adburst_core::{CreationId, CreditTransactionId, UserId};

use super::RepositoryError;
use crate::models::CreditTransaction;

#[derive(sqlx::FromRow)]
struct CreditTransactionRow {
    id: CreditTransactionId,
    user_id: UserId,
    delta: i32,
    reason: String,
    creation_id: Option<CreationId>,
    created_at: DateTime<Utc>,
}

impl From<CreditTransactionRow> for CreditTransaction {
    fn from(row: CreditTransactionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            delta: row.delta,
            reason: row.reason,
            creation_id: row.creation_id,
            created_at: row.created_at,
        }
    }
}

/// Repository for credit balance changes.
pub struct CreditRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CreditRepository<'a> {
    /// Create a new credit repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Most recent ledger entries for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<CreditTransaction>, RepositoryError> {
        let rows: Vec<CreditTransactionRow> = sqlx::query_as(
            r"
            SELECT id, user_id, delta, reason, creation_id, created_at
            FROM adburst.credit_transaction
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CreditTransaction::from).collect())
    }

    /// Add (or, with a negative amount, remove) credits and return the new balance.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InsufficientCredits` if a removal would make
    /// the balance negative, `RepositoryError::NotFound` for an unknown user.
    pub async fn adjust(
        &self,
        user_id: UserId,
        delta: i32,
        reason: &str,
    ) -> Result<i32, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let balance = apply_delta(&mut *tx, user_id, delta, reason, None).await?;
        tx.commit().await?;
        Ok(balance)
    }
}

/// Apply a ledger entry on an open connection or transaction.
///
/// The balance update is guarded so it can never go below zero; a guarded
/// miss on an existing user is reported as `InsufficientCredits`.
///
/// # Errors
///
/// Returns `RepositoryError::InsufficientCredits`, `RepositoryError::NotFound`
/// or `RepositoryError::Database`.
pub async fn apply_delta(
    conn: &mut PgConnection,
    user_id: UserId,
    delta: i32,
    reason: &str,
    creation_id: Option<CreationId>,
) -> Result<i32, RepositoryError> {
    if delta == 0 {
        let balance: Option<i32> =
            sqlx::query_scalar("SELECT credits FROM adburst.user WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?;
        return balance.ok_or(RepositoryError::NotFound);
    }

    let balance: Option<i32> = sqlx::query_scalar(
        r"
        UPDATE adburst.user
        SET credits = credits + $2, updated_at = NOW()
        WHERE id = $1 AND credits + $2 >= 0
        RETURNING credits
        ",
    )
    .bind(user_id)
    .bind(delta)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(balance) = balance else {
        let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM adburst.user WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
        return Err(if exists.is_some() {
            RepositoryError::InsufficientCredits
        } else {
            RepositoryError::NotFound
        });
    };

    sqlx::query(
        r"
        INSERT INTO adburst.credit_transaction (user_id, delta, reason, creation_id)
        VALUES ($1, $2, $3, $4)
        ",
    )
    .bind(user_id)
    .bind(delta)
    .bind(reason)
    .bind(creation_id)
    .execute(&mut *conn)
    .await?;

    Ok(balance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion() {
        let now = Utc::now();
        let tx = CreditTransaction::from(CreditTransactionRow {
            id: CreditTransactionId::new(1),
            user_id: UserId::new(2),
            delta: -1,
            reason: "generation".to_string(),
            creation_id: Some(CreationId::new(9)),
            created_at: now,
        });
        assert_eq!(tx.delta, -1);
        assert_eq!(tx.creation_id, Some(CreationId::new(9)));
    }
}
