//! Database operations for the AdBurst `PostgreSQL` schema.
//!
//! ## Tables (schema `adburst`)
//!
//! - `user` - Accounts, credit balance and subscription tier
//! - `session` - Tower-sessions storage
//! - `brand_kit` - Saved colours/fonts/logo, at most one active per user
//! - `creation` - Generated designs and their share tokens
//! - `credit_transaction` - Signed credit ledger
//! - `social_account` / `social_post` - Connected accounts and scheduled posts
//! - `competitor_ad` - Saved ad inspiration
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p adburst-cli -- migrate
//! ```

pub mod brand_kits;
pub mod competitor_ads;
pub mod creations;
pub mod credits;
pub mod social;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use brand_kits::BrandKitRepository;
pub use competitor_ads::CompetitorAdRepository;
pub use creations::CreationRepository;
pub use credits::CreditRepository;
pub use social::{SocialAccountRepository, SocialPostRepository};
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The balance does not cover the requested debit.
    #[error("insufficient credits")]
    InsufficientCredits,
}

/// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Parse a text column into a typed value, reporting bad data as corruption.
pub(crate) fn parse_column<T>(column: &str, value: &str) -> Result<T, RepositoryError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid {column} in database: {e}"))
    })
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use adburst_core::PostStatus;

    use super::*;

    #[test]
    fn test_parse_column_reports_corruption() {
        let ok: PostStatus = parse_column("status", "posted").expect("parse");
        assert_eq!(ok, PostStatus::Posted);

        let err = parse_column::<PostStatus>("status", "lost").unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
        assert_eq!(
            err.to_string(),
            "data corruption: invalid status in database: invalid post status: 'lost'"
        );
    }
}
