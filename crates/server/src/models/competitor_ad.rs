//! Saved competitor ads used as inspiration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adburst_core::{CompetitorAdId, UserId};

use super::{ModelError, optional_text, optional_url, required_text};

/// A competitor ad saved by a user.
#[derive(Debug, Clone, Serialize)]
pub struct CompetitorAd {
    pub id: CompetitorAdId,
    pub user_id: UserId,
    pub title: String,
    pub advertiser: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub source_url: Option<String>,
    pub platform: Option<String>,
    pub search_query: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// An ad candidate: returned by inspiration search and accepted by the save endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorAdInput {
    pub title: String,
    #[serde(default)]
    pub advertiser: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub search_query: Option<String>,
}

impl CompetitorAdInput {
    /// Validate the input, returning it with trimmed fields.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` for a blank title or non-http(s) URLs.
    pub fn validate(self) -> Result<Self, ModelError> {
        Ok(Self {
            title: required_text("title", &self.title, 300)?,
            advertiser: optional_text("advertiser", self.advertiser.as_deref(), 200)?,
            description: optional_text("description", self.description.as_deref(), 2000)?,
            image_url: optional_url("image_url", self.image_url.as_deref())?,
            source_url: optional_url("source_url", self.source_url.as_deref())?,
            platform: optional_text("platform", self.platform.as_deref(), 50)?,
            search_query: optional_text("search_query", self.search_query.as_deref(), 200)?,
        })
    }
}

impl CompetitorAd {
    /// One-line description used when citing the ad as inspiration.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = self.title.clone();
        if let Some(advertiser) = &self.advertiser {
            line.push_str(&format!(" (by {advertiser})"));
        }
        if let Some(description) = &self.description {
            line.push_str(": ");
            line.push_str(description);
        }
        line
    }
}
