//! Creations: persisted generated designs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adburst_core::{AspectRatio, BrandKitId, CreationId, CreationKind, UserId};

use super::{ModelError, optional_text};

const MAX_HEADLINE_LEN: usize = 300;
const MAX_CONTENT_LEN: usize = 5000;

/// A persisted creation.
#[derive(Debug, Clone, Serialize)]
pub struct Creation {
    pub id: CreationId,
    pub user_id: UserId,
    pub brand_kit_id: Option<BrandKitId>,
    pub kind: CreationKind,
    pub image_url: String,
    pub headline: Option<String>,
    pub content: Option<String>,
    pub style_prompt: String,
    pub template_id: Option<String>,
    pub aspect_ratio: AspectRatio,
    pub metadata: serde_json::Value,
    pub share_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written when a generation succeeds.
#[derive(Debug, Clone)]
pub struct NewCreation {
    pub user_id: UserId,
    pub brand_kit_id: Option<BrandKitId>,
    pub kind: CreationKind,
    pub image_url: String,
    pub headline: Option<String>,
    pub content: Option<String>,
    pub style_prompt: String,
    pub template_id: Option<String>,
    pub aspect_ratio: AspectRatio,
    pub metadata: serde_json::Value,
}

/// Request body for `PUT /api/creations/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreationUpdate {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl CreationUpdate {
    /// Validate the update.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` for overlong text or a non-object metadata value.
    pub fn validate(self) -> Result<Self, ModelError> {
        if let Some(metadata) = &self.metadata
            && !metadata.is_object()
        {
            return Err(ModelError::Invalid("metadata must be a JSON object".to_string()));
        }
        Ok(Self {
            headline: match self.headline {
                Some(h) => Some(
                    optional_text("headline", Some(&h), MAX_HEADLINE_LEN)?.unwrap_or_default(),
                ),
                None => None,
            },
            content: match self.content {
                Some(c) => Some(
                    optional_text("content", Some(&c), MAX_CONTENT_LEN)?.unwrap_or_default(),
                ),
                None => None,
            },
            metadata: self.metadata,
        })
    }
}

/// The public view of a shared creation.
#[derive(Debug, Clone, Serialize)]
pub struct SharedCreation {
    pub image_url: String,
    pub headline: Option<String>,
    pub content: Option<String>,
    pub aspect_ratio: AspectRatio,
    pub created_at: DateTime<Utc>,
}

impl From<Creation> for SharedCreation {
    fn from(creation: Creation) -> Self {
        Self {
            image_url: creation.image_url,
            headline: creation.headline,
            content: creation.content,
            aspect_ratio: creation.aspect_ratio,
            created_at: creation.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_update_trims_and_keeps_absent_fields() {
        let update = CreationUpdate {
            headline: Some("  Grand Opening  ".to_string()),
            content: None,
            metadata: None,
        }
        .validate()
        .unwrap();
        assert_eq!(update.headline.as_deref(), Some("Grand Opening"));
        assert!(update.content.is_none());
    }

    #[test]
    fn test_update_blank_clears_to_empty() {
        let update = CreationUpdate {
            headline: Some("   ".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(update.headline.as_deref(), Some(""));
    }

    #[test]
    fn test_update_rejects_non_object_metadata() {
        let update = CreationUpdate {
            metadata: Some(serde_json::json!([1, 2])),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_update_rejects_long_headline() {
        let update = CreationUpdate {
            headline: Some("x".repeat(MAX_HEADLINE_LEN + 1)),
            ..Default::default()
        };
        assert!(matches!(
            update.validate(),
            Err(ModelError::TooLong { field: "headline", .. })
        ));
    }
}
