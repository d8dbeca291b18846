//! Domain models and request validation.
//!
//! Request bodies deserialize into `*Input` types; `validate` turns them
//! into the checked values the repositories accept.

pub mod brand_kit;
pub mod competitor_ad;
pub mod creation;
pub mod credits;
pub mod generation;
pub mod session;
pub mod social;
pub mod user;

use adburst_core::ColorError;
use thiserror::Error;

pub use brand_kit::{BrandKit, BrandKitInput, NewBrandKit};
pub use competitor_ad::{CompetitorAd, CompetitorAdInput};
pub use creation::{Creation, CreationUpdate, NewCreation, SharedCreation};
pub use credits::{CreditSummary, CreditTransaction};
pub use generation::{
    AdBurstRequest, AdBurstResult, GenerateRequest, Generation, GenerationResult,
};
pub use session::{CurrentUser, keys as session_keys};
pub use social::{
    NewSocialPost, SocialAccount, SocialAccountInput, SocialPost, SocialPostInput,
    SocialPostUpdate,
};
pub use user::User;

/// Validation failures for client-supplied data.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A required field was missing or blank.
    #[error("{0} is required")]
    Required(&'static str),

    /// A field exceeded its maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Offending field.
        field: &'static str,
        /// Maximum length in characters.
        max: usize,
    },

    /// A colour field did not parse.
    #[error("invalid {field}: {source}")]
    Color {
        /// Offending field.
        field: &'static str,
        /// Parse failure.
        #[source]
        source: ColorError,
    },

    /// A URL field was not an absolute http(s) URL.
    #[error("{0} must be an http(s) URL")]
    Url(&'static str),

    /// Any other invalid value.
    #[error("{0}")]
    Invalid(String),
}

/// Trim a required text field and enforce its maximum length.
pub(crate) fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ModelError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ModelError::Required(field));
    }
    if trimmed.chars().count() > max {
        return Err(ModelError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field; blank becomes `None`.
pub(crate) fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, ModelError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) if v.chars().count() > max => Err(ModelError::TooLong { field, max }),
        Some(v) => Ok(Some(v.to_string())),
        None => Ok(None),
    }
}

/// Validate an optional absolute http(s) URL; blank becomes `None`.
pub(crate) fn optional_url(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<String>, ModelError> {
    let Some(raw) = optional_text(field, value, 2048)? else {
        return Ok(None);
    };
    match url::Url::parse(&raw) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(Some(raw)),
        _ => Err(ModelError::Url(field)),
    }
}

/// Like [`optional_url`], for images placed into a rendered design.
///
/// These end up inside CSS `url('...')`, where quotes, parentheses and
/// backslashes would end the value.
pub(crate) fn optional_image_url(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<String>, ModelError> {
    let url = optional_url(field, value)?;
    if url.as_deref().is_some_and(|url| url.contains(['\'', '"', '(', ')', '\\'])) {
        return Err(ModelError::Url(field));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("name", "  Summer  ", 10).unwrap(), "Summer");
        assert!(matches!(
            required_text("name", "   ", 10),
            Err(ModelError::Required("name"))
        ));
        assert!(matches!(
            required_text("name", "abcdefghijk", 10),
            Err(ModelError::TooLong { field: "name", max: 10 })
        ));
    }

    #[test]
    fn test_optional_url() {
        assert_eq!(optional_url("logo_url", None).unwrap(), None);
        assert_eq!(optional_url("logo_url", Some("  ")).unwrap(), None);
        assert_eq!(
            optional_url("logo_url", Some("https://cdn.example.com/logo.png")).unwrap(),
            Some("https://cdn.example.com/logo.png".to_string())
        );
        assert!(optional_url("logo_url", Some("javascript:alert(1)")).is_err());
        assert!(optional_url("logo_url", Some("not a url")).is_err());
    }

    #[test]
    fn test_optional_url_rejects_css_breakout() {
        for raw in [
            "https://cdn.example.com/a.png');background:url('https://evil.example/x",
            "https://cdn.example.com/a(1).png",
            "https://cdn.example.com/a\\b.png",
            "https://cdn.example.com/\"x.png",
        ] {
            assert!(
                matches!(optional_image_url("background_image_url", Some(raw)), Err(ModelError::Url(_))),
                "{raw} should be rejected"
            );
        }
        assert_eq!(
            optional_image_url("logo_url", Some("https://cdn.example.com/logo.png")).unwrap(),
            Some("https://cdn.example.com/logo.png".to_string())
        );
        assert!(optional_url("source_url", Some("https://example.com/wiki/Ad_(marketing)")).is_ok());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ModelError::Required("name").to_string(), "name is required");
        let err = ModelError::Color {
            field: "primary_color",
            source: ColorError::MissingHash,
        };
        assert_eq!(
            err.to_string(),
            "invalid primary_color: colour must start with '#'"
        );
    }
}
