//! Creation repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use adburst_core::{BrandKitId, CreationId, CreationKind, UserId};

use super::credits::apply_delta;
use super::{RepositoryError, conflict_on_unique, parse_column};
use crate::models::{Creation, CreationUpdate, NewCreation};

const CREATION_COLUMNS: &str = "id, user_id, brand_kit_id, kind, image_url, headline, content, \
     style_prompt, template_id, aspect_ratio, metadata, share_token, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CreationRow {
    id: CreationId,
    user_id: UserId,
    brand_kit_id: Option<BrandKitId>,
    kind: String,
    image_url: String,
    headline: Option<String>,
    content: Option<String>,
    style_prompt: String,
    template_id: Option<String>,
    aspect_ratio: String,
    metadata: serde_json::Value,
    share_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CreationRow> for Creation {
    type Error = RepositoryError;

    fn try_from(row: CreationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            brand_kit_id: row.brand_kit_id,
            kind: parse_column("kind", &row.kind)?,
            image_url: row.image_url,
            headline: row.headline,
            content: row.content,
            style_prompt: row.style_prompt,
            template_id: row.template_id,
            aspect_ratio: parse_column("aspect_ratio", &row.aspect_ratio)?,
            metadata: row.metadata,
            share_token: row.share_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for creations.
pub struct CreationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CreationRepository<'a> {
    /// Create a new creation repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a creation and charge for it in one transaction.
    ///
    /// Returns the creation and the remaining balance.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InsufficientCredits` if the balance no longer
    /// covers `cost`; nothing is written in that case.
    pub async fn create_charged(
        &self,
        new: &NewCreation,
        cost: i32,
    ) -> Result<(Creation, i32), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: CreationRow = sqlx::query_as(&format!(
            r"
            INSERT INTO adburst.creation
                (user_id, brand_kit_id, kind, image_url, headline, content,
                 style_prompt, template_id, aspect_ratio, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {CREATION_COLUMNS}
            "
        ))
        .bind(new.user_id)
        .bind(new.brand_kit_id)
        .bind(new.kind.as_str())
        .bind(&new.image_url)
        .bind(new.headline.as_deref())
        .bind(new.content.as_deref())
        .bind(&new.style_prompt)
        .bind(new.template_id.as_deref())
        .bind(new.aspect_ratio.as_str())
        .bind(&new.metadata)
        .fetch_one(&mut *tx)
        .await?;

        let balance = apply_delta(&mut *tx, new.user_id, -cost, "generation", Some(row.id)).await?;

        tx.commit().await?;
        Ok((Creation::try_from(row)?, balance))
    }

    /// A page of creations, newest first, optionally filtered by kind.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        user_id: UserId,
        kind: Option<CreationKind>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Creation>, RepositoryError> {
        let rows: Vec<CreationRow> = sqlx::query_as(&format!(
            r"
            SELECT {CREATION_COLUMNS} FROM adburst.creation
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR kind = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(user_id)
        .bind(kind.map(CreationKind::as_str))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Creation::try_from).collect()
    }

    /// Get one creation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: CreationId,
    ) -> Result<Option<Creation>, RepositoryError> {
        let row: Option<CreationRow> = sqlx::query_as(&format!(
            "SELECT {CREATION_COLUMNS} FROM adburst.creation WHERE user_id = $1 AND id = $2"
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Creation::try_from).transpose()
    }

    /// Update headline, content and metadata. Absent fields keep their value;
    /// an empty string clears the column.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        user_id: UserId,
        id: CreationId,
        update: &CreationUpdate,
    ) -> Result<Option<Creation>, RepositoryError> {
        let row: Option<CreationRow> = sqlx::query_as(&format!(
            r"
            UPDATE adburst.creation
            SET headline = CASE WHEN $3::TEXT IS NULL THEN headline ELSE NULLIF($3, '') END,
                content = CASE WHEN $4::TEXT IS NULL THEN content ELSE NULLIF($4, '') END,
                metadata = COALESCE($5, metadata),
                updated_at = NOW()
            WHERE user_id = $1 AND id = $2
            RETURNING {CREATION_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(id)
        .bind(update.headline.as_deref())
        .bind(update.content.as_deref())
        .bind(update.metadata.as_ref())
        .fetch_optional(self.pool)
        .await?;

        row.map(Creation::try_from).transpose()
    }

    /// Delete a creation. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, user_id: UserId, id: CreationId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM adburst.creation WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Assign `token` unless the creation already has one; returns the token in effect.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a token collision.
    pub async fn share(
        &self,
        user_id: UserId,
        id: CreationId,
        token: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let token: Option<Option<String>> = sqlx::query_scalar(
            r"
            UPDATE adburst.creation
            SET share_token = COALESCE(share_token, $3), updated_at = NOW()
            WHERE user_id = $1 AND id = $2
            RETURNING share_token
            ",
        )
        .bind(user_id)
        .bind(id)
        .bind(token)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "share token collision"))?;

        Ok(token.flatten())
    }

    /// Remove the share token. Returns whether the creation exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unshare(&self, user_id: UserId, id: CreationId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE adburst.creation
            SET share_token = NULL, updated_at = NOW()
            WHERE user_id = $1 AND id = $2
            ",
        )
        .bind(user_id)
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Look up a shared creation by its public token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_shared(&self, token: &str) -> Result<Option<Creation>, RepositoryError> {
        let row: Option<CreationRow> = sqlx::query_as(&format!(
            "SELECT {CREATION_COLUMNS} FROM adburst.creation WHERE share_token = $1"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        row.map(Creation::try_from).transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use adburst_core::AspectRatio;

    use super::*;

    fn row(kind: &str, aspect: &str) -> CreationRow {
        let now = Utc::now();
        CreationRow {
            id: CreationId::new(4),
            user_id: UserId::new(1),
            brand_kit_id: None,
            kind: kind.to_string(),
            image_url: "http://localhost:3000/uploads/creations/a.png".to_string(),
            headline: Some("Grand Opening".to_string()),
            content: None,
            style_prompt: "bold neon".to_string(),
            template_id: None,
            aspect_ratio: aspect.to_string(),
            metadata: serde_json::json!({"fonts": ["Inter"]}),
            share_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_conversion() {
        let creation = Creation::try_from(row("ad", "9:16")).unwrap();
        assert_eq!(creation.kind, CreationKind::Ad);
        assert_eq!(creation.aspect_ratio, AspectRatio::Story);
        assert_eq!(creation.metadata["fonts"][0], "Inter");
    }

    #[test]
    fn test_row_conversion_rejects_corrupt_values() {
        assert!(Creation::try_from(row("poster", "1:1")).is_err());
        assert!(Creation::try_from(row("flyer", "2:1")).is_err());
    }
}
