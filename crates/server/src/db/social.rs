//! Social account and scheduled post repositories.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use adburst_core::{CreationId, PostStatus, SocialAccountId, SocialPostId, UserId};

use super::{RepositoryError, parse_column};
use crate::models::{NewSocialPost, SocialAccount, SocialAccountInput, SocialPost};

const ACCOUNT_COLUMNS: &str =
    "id, user_id, platform, account_name, credentials, is_active, created_at, updated_at";

const POST_COLUMNS: &str = "id, user_id, social_account_id, creation_id, caption, hashtags, \
     scheduled_at, status, posted_at, error_message, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct SocialAccountRow {
    id: SocialAccountId,
    user_id: UserId,
    platform: String,
    account_name: String,
    credentials: serde_json::Value,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SocialAccountRow> for SocialAccount {
    type Error = RepositoryError;

    fn try_from(row: SocialAccountRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            platform: parse_column("platform", &row.platform)?,
            account_name: row.account_name,
            credentials: row.credentials,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SocialPostRow {
    id: SocialPostId,
    user_id: UserId,
    social_account_id: SocialAccountId,
    creation_id: Option<CreationId>,
    caption: String,
    hashtags: Vec<String>,
    scheduled_at: DateTime<Utc>,
    status: String,
    posted_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SocialPostRow> for SocialPost {
    type Error = RepositoryError;

    fn try_from(row: SocialPostRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            social_account_id: row.social_account_id,
            creation_id: row.creation_id,
            caption: row.caption,
            hashtags: row.hashtags,
            scheduled_at: row.scheduled_at,
            status: parse_column("status", &row.status)?,
            posted_at: row.posted_at,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for social accounts.
pub struct SocialAccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SocialAccountRepository<'a> {
    /// Create a new social account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All accounts for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<SocialAccount>, RepositoryError> {
        let rows: Vec<SocialAccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM adburst.social_account WHERE user_id = $1 ORDER BY platform, account_name"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(SocialAccount::try_from).collect()
    }

    /// Get one account owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: SocialAccountId,
    ) -> Result<Option<SocialAccount>, RepositoryError> {
        let row: Option<SocialAccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM adburst.social_account WHERE user_id = $1 AND id = $2"
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(SocialAccount::try_from).transpose()
    }

    /// Get an account by id regardless of owner (scheduler use).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_any(
        &self,
        id: SocialAccountId,
    ) -> Result<Option<SocialAccount>, RepositoryError> {
        let row: Option<SocialAccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM adburst.social_account WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(SocialAccount::try_from).transpose()
    }

    /// Insert an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &SocialAccountInput,
    ) -> Result<SocialAccount, RepositoryError> {
        let empty = serde_json::Value::Object(serde_json::Map::new());
        let row: SocialAccountRow = sqlx::query_as(&format!(
            r"
            INSERT INTO adburst.social_account (user_id, platform, account_name, credentials, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACCOUNT_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(input.platform.as_str())
        .bind(&input.account_name)
        .bind(input.credentials.as_ref().unwrap_or(&empty))
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await?;

        SocialAccount::try_from(row)
    }

    /// Update an account. Credentials are replaced only when supplied.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        user_id: UserId,
        id: SocialAccountId,
        input: &SocialAccountInput,
    ) -> Result<Option<SocialAccount>, RepositoryError> {
        let row: Option<SocialAccountRow> = sqlx::query_as(&format!(
            r"
            UPDATE adburst.social_account
            SET platform = $3, account_name = $4, credentials = COALESCE($5, credentials),
                is_active = $6, updated_at = NOW()
            WHERE user_id = $1 AND id = $2
            RETURNING {ACCOUNT_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(id)
        .bind(input.platform.as_str())
        .bind(&input.account_name)
        .bind(input.credentials.as_ref())
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await?;

        row.map(SocialAccount::try_from).transpose()
    }

    /// Delete an account and, by cascade, its posts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(
        &self,
        user_id: UserId,
        id: SocialAccountId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM adburst.social_account WHERE user_id = $1 AND id = $2")
                .bind(user_id)
                .bind(id)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Repository for scheduled posts.
pub struct SocialPostRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SocialPostRepository<'a> {
    /// Create a new social post repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Posts for a user ordered by schedule time, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        user_id: UserId,
        status: Option<PostStatus>,
    ) -> Result<Vec<SocialPost>, RepositoryError> {
        let rows: Vec<SocialPostRow> = sqlx::query_as(&format!(
            r"
            SELECT {POST_COLUMNS} FROM adburst.social_post
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY scheduled_at, id
            "
        ))
        .bind(user_id)
        .bind(status.map(PostStatus::as_str))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(SocialPost::try_from).collect()
    }

    /// Get one post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: SocialPostId,
    ) -> Result<Option<SocialPost>, RepositoryError> {
        let row: Option<SocialPostRow> = sqlx::query_as(&format!(
            "SELECT {POST_COLUMNS} FROM adburst.social_post WHERE user_id = $1 AND id = $2"
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(SocialPost::try_from).transpose()
    }

    /// Schedule a post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        post: &NewSocialPost,
    ) -> Result<SocialPost, RepositoryError> {
        let row: SocialPostRow = sqlx::query_as(&format!(
            r"
            INSERT INTO adburst.social_post
                (user_id, social_account_id, creation_id, caption, hashtags, scheduled_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(post.social_account_id)
        .bind(post.creation_id)
        .bind(&post.caption)
        .bind(&post.hashtags)
        .bind(post.scheduled_at)
        .fetch_one(self.pool)
        .await?;

        SocialPost::try_from(row)
    }

    /// Rewrite a post that is still scheduled.
    ///
    /// Returns `None` if the post does not exist or has left the `scheduled` state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_scheduled(
        &self,
        user_id: UserId,
        id: SocialPostId,
        post: &NewSocialPost,
    ) -> Result<Option<SocialPost>, RepositoryError> {
        let row: Option<SocialPostRow> = sqlx::query_as(&format!(
            r"
            UPDATE adburst.social_post
            SET social_account_id = $3, creation_id = $4, caption = $5, hashtags = $6,
                scheduled_at = $7, updated_at = NOW()
            WHERE user_id = $1 AND id = $2 AND status = 'scheduled'
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(id)
        .bind(post.social_account_id)
        .bind(post.creation_id)
        .bind(&post.caption)
        .bind(&post.hashtags)
        .bind(post.scheduled_at)
        .fetch_optional(self.pool)
        .await?;

        row.map(SocialPost::try_from).transpose()
    }

    /// Delete a post in any state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, user_id: UserId, id: SocialPostId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM adburst.social_post WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Scheduled posts whose time has come, oldest first.
    ///
    /// Rows that fail to convert are logged and left out, so one bad row
    /// cannot hold up the rest of the queue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<SocialPost>, RepositoryError> {
        let rows: Vec<SocialPostRow> = sqlx::query_as(&format!(
            r"
            SELECT {POST_COLUMNS} FROM adburst.social_post
            WHERE status = 'scheduled' AND scheduled_at <= $1
            ORDER BY scheduled_at, id
            LIMIT $2
            "
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(readable_posts(rows))
    }

    /// Move a scheduled post to `posted`. Returns false if another worker got there first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_posted(
        &self,
        id: SocialPostId,
        posted_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE adburst.social_post
            SET status = 'posted', posted_at = $2, error_message = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'scheduled'
            ",
        )
        .bind(id)
        .bind(posted_at)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move a scheduled post to `failed` with a reason.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_failed(
        &self,
        id: SocialPostId,
        error_message: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE adburst.social_post
            SET status = 'failed', error_message = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'scheduled'
            ",
        )
        .bind(id)
        .bind(error_message)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn readable_posts(rows: Vec<SocialPostRow>) -> Vec<SocialPost> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            SocialPost::try_from(row)
                .map_err(|e| tracing::error!(post_id = %id, error = %e, "Skipping unreadable social post"))
                .ok()
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use adburst_core::SocialPlatform;

    use super::*;

    #[test]
    fn test_post_row_conversion() {
        let now = Utc::now();
        let row = SocialPostRow {
            id: SocialPostId::new(1),
            user_id: UserId::new(1),
            social_account_id: SocialAccountId::new(2),
            creation_id: Some(CreationId::new(3)),
            caption: "Launch day".to_string(),
            hashtags: vec!["launch".to_string()],
            scheduled_at: now,
            status: "failed".to_string(),
            posted_at: None,
            error_message: Some("account inactive".to_string()),
            created_at: now,
            updated_at: now,
        };
        let post = SocialPost::try_from(row).unwrap();
        assert_eq!(post.status, PostStatus::Failed);
        assert!(!post.status.is_editable());
    }

    #[test]
    fn test_account_row_conversion() {
        let now = Utc::now();
        let row = SocialAccountRow {
            id: SocialAccountId::new(2),
            user_id: UserId::new(1),
            platform: "facebook".to_string(),
            account_name: "Acme Page".to_string(),
            credentials: serde_json::json!({}),
            is_active: false,
            created_at: now,
            updated_at: now,
        };
        let account = SocialAccount::try_from(row).unwrap();
        assert_eq!(account.platform, SocialPlatform::Facebook);
        assert!(account.webhook_url().is_none());
    }

    #[test]
    fn test_unreadable_rows_are_skipped() {
        let now = Utc::now();
        let row = |id: i32, status: &str| SocialPostRow {
            id: SocialPostId::new(id),
            user_id: UserId::new(1),
            social_account_id: SocialAccountId::new(2),
            creation_id: None,
            caption: "Doors open at 9".to_string(),
            hashtags: Vec::new(),
            scheduled_at: now,
            status: status.to_string(),
            posted_at: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        };

        let posts = readable_posts(vec![row(1, "scheduled"), row(2, "archived"), row(3, "scheduled")]);
        let ids: Vec<_> = posts.iter().map(|post| post.id).collect();
        assert_eq!(ids, vec![SocialPostId::new(1), SocialPostId::new(3)]);
    }
}
