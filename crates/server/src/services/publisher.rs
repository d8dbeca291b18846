//! Publishing scheduled posts to social accounts.
//!
//! Each account carries a `webhook_url` in its credentials. Publishing POSTs
//! a JSON payload there; the integration behind the webhook owns the actual
//! platform API.

use std::time::Duration;

use adburst_core::{SocialPlatform, SocialPostId};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::models::{SocialAccount, SocialPost};

/// Errors that can occur while publishing a post.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The account has no webhook in its credentials.
    #[error("no publisher configured for {0}")]
    NotConfigured(SocialPlatform),

    /// The account was deactivated.
    #[error("account inactive")]
    Inactive,

    /// The account no longer exists.
    #[error("social account not found")]
    AccountMissing,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The webhook answered with a non-success status.
    #[error("publisher rejected the post with status {0}")]
    Rejected(u16),
}

/// Body POSTed to a publishing webhook.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PublishPayload<'a> {
    pub post_id: SocialPostId,
    pub platform: SocialPlatform,
    pub account_name: &'a str,
    pub caption: &'a str,
    pub hashtags: &'a [String],
    pub image_url: Option<&'a str>,
}

/// Sends posts to account webhooks.
#[derive(Clone)]
pub struct WebhookPublisher {
    client: reqwest::Client,
    timeout: Duration,
}

impl WebhookPublisher {
    #[must_use]
    pub const fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Publish `post` through `account`.
    ///
    /// # Errors
    ///
    /// Returns `PublishError` if the account cannot publish or the webhook
    /// fails.
    #[instrument(skip_all, fields(post_id = %post.id, platform = %account.platform))]
    pub async fn publish(
        &self,
        account: &SocialAccount,
        post: &SocialPost,
        image_url: Option<&str>,
    ) -> Result<(), PublishError> {
        let webhook = webhook_for(account)?;
        let payload = PublishPayload {
            post_id: post.id,
            platform: account.platform,
            account_name: &account.account_name,
            caption: &post.caption,
            hashtags: &post.hashtags,
            image_url,
        };

        let response = self
            .client
            .post(webhook)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Rejected(status.as_u16()));
        }

        tracing::info!("Post published");
        Ok(())
    }
}

/// The account's webhook, if it is able to publish.
fn webhook_for(account: &SocialAccount) -> Result<&str, PublishError> {
    if !account.is_active {
        return Err(PublishError::Inactive);
    }
    account
        .webhook_url()
        .ok_or(PublishError::NotConfigured(account.platform))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use adburst_core::{SocialAccountId, UserId};
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn account(credentials: serde_json::Value, is_active: bool) -> SocialAccount {
        let now = Utc::now();
        SocialAccount {
            id: SocialAccountId::new(1),
            user_id: UserId::new(1),
            platform: SocialPlatform::Instagram,
            account_name: "@cafe".to_string(),
            credentials,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_missing_webhook() {
        let err = webhook_for(&account(json!({}), true)).unwrap_err();
        assert_eq!(err.to_string(), "no publisher configured for instagram");
    }

    #[test]
    fn test_inactive_account() {
        let err = webhook_for(&account(json!({"webhook_url": "https://hooks.example.com/x"}), false))
            .unwrap_err();
        assert_eq!(err.to_string(), "account inactive");
    }

    #[test]
    fn test_webhook_found() {
        let acct = account(json!({"webhook_url": "https://hooks.example.com/x"}), true);
        assert_eq!(webhook_for(&acct).unwrap(), "https://hooks.example.com/x");
    }

    #[test]
    fn test_payload_shape() {
        let hashtags = vec!["coffee".to_string()];
        let payload = PublishPayload {
            post_id: SocialPostId::new(9),
            platform: SocialPlatform::Twitter,
            account_name: "cafe",
            caption: "Open today",
            hashtags: &hashtags,
            image_url: None,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "post_id": 9,
                "platform": "twitter",
                "account_name": "cafe",
                "caption": "Open today",
                "hashtags": ["coffee"],
                "image_url": null
            })
        );
    }
}
