//! Social accounts and scheduled posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adburst_core::{CreationId, PostStatus, SocialAccountId, SocialPlatform, SocialPostId, UserId};

use super::{ModelError, optional_url, required_text};

const MAX_ACCOUNT_NAME_LEN: usize = 100;
const MAX_CAPTION_LEN: usize = 2200;
const MAX_HASHTAGS: usize = 30;
const MAX_HASHTAG_LEN: usize = 100;

/// Credential key holding the publishing webhook.
pub const WEBHOOK_URL_KEY: &str = "webhook_url";

/// A connected social account.
///
/// `credentials` is never serialized to clients.
#[derive(Debug, Clone, Serialize)]
pub struct SocialAccount {
    pub id: SocialAccountId,
    pub user_id: UserId,
    pub platform: SocialPlatform,
    pub account_name: String,
    #[serde(skip_serializing)]
    pub credentials: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SocialAccount {
    /// Publishing webhook stored in the credentials, if any.
    #[must_use]
    pub fn webhook_url(&self) -> Option<&str> {
        self.credentials
            .get(WEBHOOK_URL_KEY)
            .and_then(serde_json::Value::as_str)
            .filter(|url| !url.trim().is_empty())
    }
}

/// Request body for creating or updating a social account.
#[derive(Debug, Clone, Deserialize)]
pub struct SocialAccountInput {
    pub platform: SocialPlatform,
    pub account_name: String,
    #[serde(default)]
    pub credentials: Option<serde_json::Value>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

impl SocialAccountInput {
    /// Validate the input, returning it with trimmed fields.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` for a blank account name, non-object credentials
    /// or an invalid webhook URL.
    pub fn validate(self) -> Result<Self, ModelError> {
        let account_name = required_text("account_name", &self.account_name, MAX_ACCOUNT_NAME_LEN)?;
        let credentials = match self.credentials {
            Some(value) if value.is_object() => {
                optional_url(
                    "credentials.webhook_url",
                    value.get(WEBHOOK_URL_KEY).and_then(serde_json::Value::as_str),
                )?;
                Some(value)
            }
            Some(serde_json::Value::Null) | None => None,
            Some(_) => {
                return Err(ModelError::Invalid(
                    "credentials must be a JSON object".to_string(),
                ));
            }
        };
        Ok(Self {
            platform: self.platform,
            account_name,
            credentials,
            is_active: self.is_active,
        })
    }
}

/// A scheduled (or already published) social post.
#[derive(Debug, Clone, Serialize)]
pub struct SocialPost {
    pub id: SocialPostId,
    pub user_id: UserId,
    pub social_account_id: SocialAccountId,
    pub creation_id: Option<CreationId>,
    pub caption: String,
    pub hashtags: Vec<String>,
    pub scheduled_at: DateTime<Utc>,
    pub status: PostStatus,
    pub posted_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for scheduling a post.
#[derive(Debug, Clone, Deserialize)]
pub struct SocialPostInput {
    pub social_account_id: SocialAccountId,
    #[serde(default)]
    pub creation_id: Option<CreationId>,
    pub caption: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub scheduled_at: DateTime<Utc>,
}

/// A validated post ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSocialPost {
    pub social_account_id: SocialAccountId,
    pub creation_id: Option<CreationId>,
    pub caption: String,
    pub hashtags: Vec<String>,
    pub scheduled_at: DateTime<Utc>,
}

impl SocialPostInput {
    /// Validate the input.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` for a blank or overlong caption or invalid hashtags.
    pub fn validate(self) -> Result<NewSocialPost, ModelError> {
        Ok(NewSocialPost {
            social_account_id: self.social_account_id,
            creation_id: self.creation_id,
            caption: required_text("caption", &self.caption, MAX_CAPTION_LEN)?,
            hashtags: normalize_hashtags(&self.hashtags)?,
            scheduled_at: self.scheduled_at,
        })
    }
}

/// Request body for `PUT /api/social-posts/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SocialPostUpdate {
    #[serde(default)]
    pub social_account_id: Option<SocialAccountId>,
    #[serde(default)]
    pub creation_id: Option<CreationId>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub hashtags: Option<Vec<String>>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl SocialPostUpdate {
    /// Apply the update on top of an existing post.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` if the merged post is invalid.
    pub fn apply(self, current: &SocialPost) -> Result<NewSocialPost, ModelError> {
        SocialPostInput {
            social_account_id: self.social_account_id.unwrap_or(current.social_account_id),
            creation_id: self.creation_id.or(current.creation_id),
            caption: self.caption.unwrap_or_else(|| current.caption.clone()),
            hashtags: self.hashtags.unwrap_or_else(|| current.hashtags.clone()),
            scheduled_at: self.scheduled_at.unwrap_or(current.scheduled_at),
        }
        .validate()
    }
}

/// Strip leading `#`, drop blanks and duplicates, and reject embedded whitespace.
fn normalize_hashtags(tags: &[String]) -> Result<Vec<String>, ModelError> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().trim_start_matches('#');
        if tag.is_empty() {
            continue;
        }
        if tag.chars().any(char::is_whitespace) {
            return Err(ModelError::Invalid(format!(
                "hashtag '{tag}' must not contain whitespace"
            )));
        }
        if tag.chars().count() > MAX_HASHTAG_LEN {
            return Err(ModelError::TooLong {
                field: "hashtags",
                max: MAX_HASHTAG_LEN,
            });
        }
        if !out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            out.push(tag.to_string());
        }
    }
    if out.len() > MAX_HASHTAGS {
        return Err(ModelError::Invalid(format!(
            "at most {MAX_HASHTAGS} hashtags are allowed"
        )));
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn account(credentials: serde_json::Value) -> SocialAccount {
        let now = Utc::now();
        SocialAccount {
            id: SocialAccountId::new(1),
            user_id: UserId::new(1),
            platform: SocialPlatform::Instagram,
            account_name: "@shop".to_string(),
            credentials,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_credentials_not_serialized() {
        let acct = account(serde_json::json!({"webhook_url": "https://hooks.example.com/x", "token": "s3cret"}));
        let json = serde_json::to_string(&acct).unwrap();
        assert!(!json.contains("s3cret"));
        assert!(!json.contains("credentials"));
        assert_eq!(acct.webhook_url(), Some("https://hooks.example.com/x"));
    }

    #[test]
    fn test_webhook_url_missing_or_blank() {
        assert_eq!(account(serde_json::json!({})).webhook_url(), None);
        assert_eq!(account(serde_json::json!({"webhook_url": " "})).webhook_url(), None);
    }

    #[test]
    fn test_account_input_validation() {
        let input: SocialAccountInput = serde_json::from_str(
            r#"{"platform":"linkedin","account_name":"  Acme  ","credentials":{"webhook_url":"ftp://x"}}"#,
        )
        .unwrap();
        assert!(input.is_active);
        assert!(matches!(input.validate(), Err(ModelError::Url(_))));

        let input: SocialAccountInput =
            serde_json::from_str(r#"{"platform":"twitter","account_name":"Acme","credentials":"token"}"#)
                .unwrap();
        assert!(input.validate().is_err());

        assert!(
            serde_json::from_str::<SocialAccountInput>(r#"{"platform":"myspace","account_name":"x"}"#)
                .is_err()
        );
    }

    #[test]
    fn test_hashtags_normalized() {
        let tags = vec![
            "#Sale".to_string(),
            "sale".to_string(),
            " ".to_string(),
            "summer".to_string(),
        ];
        assert_eq!(normalize_hashtags(&tags).unwrap(), vec!["Sale", "summer"]);
        assert!(normalize_hashtags(&["two words".to_string()]).is_err());
    }

    #[test]
    fn test_update_merges_with_current() {
        let when = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let now = Utc::now();
        let current = SocialPost {
            id: SocialPostId::new(3),
            user_id: UserId::new(1),
            social_account_id: SocialAccountId::new(2),
            creation_id: None,
            caption: "Old caption".to_string(),
            hashtags: vec!["old".to_string()],
            scheduled_at: when,
            status: PostStatus::Scheduled,
            posted_at: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        };
        let merged = SocialPostUpdate {
            caption: Some("New caption".to_string()),
            ..Default::default()
        }
        .apply(&current)
        .unwrap();
        assert_eq!(merged.caption, "New caption");
        assert_eq!(merged.hashtags, vec!["old"]);
        assert_eq!(merged.scheduled_at, when);
        assert_eq!(merged.social_account_id, SocialAccountId::new(2));
    }
}
