//! Saved competitor ad repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use adburst_core::{CompetitorAdId, UserId};

use super::RepositoryError;
use crate::models::{CompetitorAd, CompetitorAdInput};

const AD_COLUMNS: &str = "id, user_id, title, advertiser, description, image_url, source_url, \
     platform, search_query, saved_at";

#[derive(sqlx::FromRow)]
struct CompetitorAdRow {
    id: CompetitorAdId,
    user_id: UserId,
    title: String,
    advertiser: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    source_url: Option<String>,
    platform: Option<String>,
    search_query: Option<String>,
    saved_at: DateTime<Utc>,
}

impl From<CompetitorAdRow> for CompetitorAd {
    fn from(row: CompetitorAdRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            advertiser: row.advertiser,
            description: row.description,
            image_url: row.image_url,
            source_url: row.source_url,
            platform: row.platform,
            search_query: row.search_query,
            saved_at: row.saved_at,
        }
    }
}

/// Repository for saved competitor ads.
pub struct CompetitorAdRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CompetitorAdRepository<'a> {
    /// Create a new competitor ad repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Saved ads for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<CompetitorAd>, RepositoryError> {
        let rows: Vec<CompetitorAdRow> = sqlx::query_as(&format!(
            "SELECT {AD_COLUMNS} FROM adburst.competitor_ad WHERE user_id = $1 ORDER BY saved_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CompetitorAd::from).collect())
    }

    /// The subset of `ids` owned by `user_id`, in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(
        &self,
        user_id: UserId,
        ids: &[CompetitorAdId],
    ) -> Result<Vec<CompetitorAd>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(CompetitorAdId::as_i32).collect();
        let rows: Vec<CompetitorAdRow> = sqlx::query_as(&format!(
            "SELECT {AD_COLUMNS} FROM adburst.competitor_ad WHERE user_id = $1 AND id = ANY($2) ORDER BY id"
        ))
        .bind(user_id)
        .bind(&raw)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CompetitorAd::from).collect())
    }

    /// Save an ad.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        ad: &CompetitorAdInput,
    ) -> Result<CompetitorAd, RepositoryError> {
        let row: CompetitorAdRow = sqlx::query_as(&format!(
            r"
            INSERT INTO adburst.competitor_ad
                (user_id, title, advertiser, description, image_url, source_url, platform, search_query)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {AD_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(&ad.title)
        .bind(ad.advertiser.as_deref())
        .bind(ad.description.as_deref())
        .bind(ad.image_url.as_deref())
        .bind(ad.source_url.as_deref())
        .bind(ad.platform.as_deref())
        .bind(ad.search_query.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(CompetitorAd::from(row))
    }

    /// Delete a saved ad. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(
        &self,
        user_id: UserId,
        id: CompetitorAdId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM adburst.competitor_ad WHERE user_id = $1 AND id = $2")
                .bind(user_id)
                .bind(id)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
