//! Brand kit repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use adburst_core::{BrandKitId, UserId};

use super::{RepositoryError, conflict_on_unique, parse_column};
use crate::models::{BrandKit, NewBrandKit};

const BRAND_KIT_COLUMNS: &str = "id, user_id, name, primary_color, secondary_color, accent_color, \
     heading_font, body_font, logo_url, is_active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BrandKitRow {
    id: BrandKitId,
    user_id: UserId,
    name: String,
    primary_color: String,
    secondary_color: String,
    accent_color: String,
    heading_font: Option<String>,
    body_font: Option<String>,
    logo_url: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BrandKitRow> for BrandKit {
    type Error = RepositoryError;

    fn try_from(row: BrandKitRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            primary_color: parse_column("primary_color", &row.primary_color)?,
            secondary_color: parse_column("secondary_color", &row.secondary_color)?,
            accent_color: parse_column("accent_color", &row.accent_color)?,
            heading_font: row.heading_font,
            body_font: row.body_font,
            logo_url: row.logo_url,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for brand kits. Every query is scoped to the owning user.
pub struct BrandKitRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BrandKitRepository<'a> {
    /// Create a new brand kit repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All kits for a user, active kit first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<BrandKit>, RepositoryError> {
        let rows: Vec<BrandKitRow> = sqlx::query_as(&format!(
            r"
            SELECT {BRAND_KIT_COLUMNS} FROM adburst.brand_kit
            WHERE user_id = $1
            ORDER BY is_active DESC, updated_at DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(BrandKit::try_from).collect()
    }

    /// Get one kit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: BrandKitId,
    ) -> Result<Option<BrandKit>, RepositoryError> {
        let row: Option<BrandKitRow> = sqlx::query_as(&format!(
            "SELECT {BRAND_KIT_COLUMNS} FROM adburst.brand_kit WHERE user_id = $1 AND id = $2"
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(BrandKit::try_from).transpose()
    }

    /// The user's active kit, if one is set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, user_id: UserId) -> Result<Option<BrandKit>, RepositoryError> {
        let row: Option<BrandKitRow> = sqlx::query_as(&format!(
            "SELECT {BRAND_KIT_COLUMNS} FROM adburst.brand_kit WHERE user_id = $1 AND is_active"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(BrandKit::try_from).transpose()
    }

    /// Insert a kit. An active kit deactivates the user's other kits.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        kit: &NewBrandKit,
    ) -> Result<BrandKit, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if kit.is_active {
            deactivate_all(&mut *tx, user_id, None).await?;
        }

        let row: BrandKitRow = sqlx::query_as(&format!(
            r"
            INSERT INTO adburst.brand_kit
                (user_id, name, primary_color, secondary_color, accent_color,
                 heading_font, body_font, logo_url, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {BRAND_KIT_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(&kit.name)
        .bind(kit.primary_color.as_str())
        .bind(kit.secondary_color.as_str())
        .bind(kit.accent_color.as_str())
        .bind(kit.heading_font.as_deref())
        .bind(kit.body_font.as_deref())
        .bind(kit.logo_url.as_deref())
        .bind(kit.is_active)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "another brand kit is already active"))?;

        tx.commit().await?;
        BrandKit::try_from(row)
    }

    /// Replace a kit's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update(
        &self,
        user_id: UserId,
        id: BrandKitId,
        kit: &NewBrandKit,
    ) -> Result<Option<BrandKit>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if kit.is_active {
            deactivate_all(&mut *tx, user_id, Some(id)).await?;
        }

        let row: Option<BrandKitRow> = sqlx::query_as(&format!(
            r"
            UPDATE adburst.brand_kit
            SET name = $3, primary_color = $4, secondary_color = $5, accent_color = $6,
                heading_font = $7, body_font = $8, logo_url = $9, is_active = $10,
                updated_at = NOW()
            WHERE user_id = $1 AND id = $2
            RETURNING {BRAND_KIT_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(id)
        .bind(&kit.name)
        .bind(kit.primary_color.as_str())
        .bind(kit.secondary_color.as_str())
        .bind(kit.accent_color.as_str())
        .bind(kit.heading_font.as_deref())
        .bind(kit.body_font.as_deref())
        .bind(kit.logo_url.as_deref())
        .bind(kit.is_active)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "another brand kit is already active"))?;

        // Nothing matched: roll back so the deactivation does not stick.
        let Some(row) = row else {
            return Ok(None);
        };

        tx.commit().await?;
        BrandKit::try_from(row).map(Some)
    }

    /// Make one kit the user's only active kit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn activate(
        &self,
        user_id: UserId,
        id: BrandKitId,
    ) -> Result<Option<BrandKit>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        deactivate_all(&mut *tx, user_id, Some(id)).await?;

        let row: Option<BrandKitRow> = sqlx::query_as(&format!(
            r"
            UPDATE adburst.brand_kit
            SET is_active = TRUE, updated_at = NOW()
            WHERE user_id = $1 AND id = $2
            RETURNING {BRAND_KIT_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        tx.commit().await?;
        BrandKit::try_from(row).map(Some)
    }

    /// Delete a kit. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, user_id: UserId, id: BrandKitId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM adburst.brand_kit WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Clear the active flag on every kit of `user_id` except `keep`.
async fn deactivate_all(
    conn: &mut sqlx::PgConnection,
    user_id: UserId,
    keep: Option<BrandKitId>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE adburst.brand_kit
        SET is_active = FALSE, updated_at = NOW()
        WHERE user_id = $1 AND is_active AND ($2::INTEGER IS NULL OR id <> $2)
        ",
    )
    .bind(user_id)
    .bind(keep)
    .execute(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(primary: &str) -> BrandKitRow {
        let now = Utc::now();
        BrandKitRow {
            id: BrandKitId::new(1),
            user_id: UserId::new(1),
            name: "Default".to_string(),
            primary_color: primary.to_string(),
            secondary_color: "#ffffff".to_string(),
            accent_color: "#000000".to_string(),
            heading_font: None,
            body_font: Some("Inter".to_string()),
            logo_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_conversion() {
        let kit = BrandKit::try_from(row("#ff6600")).unwrap();
        assert_eq!(kit.primary_color.as_str(), "#ff6600");
        assert_eq!(kit.body_font.as_deref(), Some("Inter"));
    }

    #[test]
    fn test_row_conversion_rejects_corrupt_colour() {
        assert!(matches!(
            BrandKit::try_from(row("orange")),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
