//! Brand kits: saved colours, fonts and logo applied to generated designs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adburst_core::{BrandKitId, HexColor, UserId};

use super::{ModelError, optional_image_url, optional_text, required_text};

const MAX_NAME_LEN: usize = 100;
const MAX_FONT_LEN: usize = 100;

/// A persisted brand kit.
#[derive(Debug, Clone, Serialize)]
pub struct BrandKit {
    pub id: BrandKitId,
    pub user_id: UserId,
    pub name: String,
    pub primary_color: HexColor,
    pub secondary_color: HexColor,
    pub accent_color: HexColor,
    pub heading_font: Option<String>,
    pub body_font: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating or replacing a brand kit.
#[derive(Debug, Clone, Deserialize)]
pub struct BrandKitInput {
    pub name: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    #[serde(default)]
    pub heading_font: Option<String>,
    #[serde(default)]
    pub body_font: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

/// A validated brand kit ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBrandKit {
    pub name: String,
    pub primary_color: HexColor,
    pub secondary_color: HexColor,
    pub accent_color: HexColor,
    pub heading_font: Option<String>,
    pub body_font: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: bool,
}

impl BrandKitInput {
    /// Validate the input.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` for a blank name, an unparseable colour, an
    /// overlong font name or a non-http(s) logo URL.
    pub fn validate(&self) -> Result<NewBrandKit, ModelError> {
        let color = |field: &'static str, value: &str| {
            HexColor::parse(value).map_err(|source| ModelError::Color { field, source })
        };

        Ok(NewBrandKit {
            name: required_text("name", &self.name, MAX_NAME_LEN)?,
            primary_color: color("primary_color", &self.primary_color)?,
            secondary_color: color("secondary_color", &self.secondary_color)?,
            accent_color: color("accent_color", &self.accent_color)?,
            heading_font: optional_text("heading_font", self.heading_font.as_deref(), MAX_FONT_LEN)?,
            body_font: optional_text("body_font", self.body_font.as_deref(), MAX_FONT_LEN)?,
            logo_url: optional_image_url("logo_url", self.logo_url.as_deref())?,
            is_active: self.is_active,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use adburst_core::ColorError;

    use super::*;

    fn input() -> BrandKitInput {
        BrandKitInput {
            name: "Summer Sale".to_string(),
            primary_color: "#FF6600".to_string(),
            secondary_color: "#fff".to_string(),
            accent_color: "#1a1a2e".to_string(),
            heading_font: Some("Playfair Display".to_string()),
            body_font: Some("  ".to_string()),
            logo_url: None,
            is_active: true,
        }
    }

    #[test]
    fn test_validate_normalizes() {
        let kit = input().validate().unwrap();
        assert_eq!(kit.name, "Summer Sale");
        assert_eq!(kit.primary_color.as_str(), "#ff6600");
        assert_eq!(kit.secondary_color.as_str(), "#ffffff");
        assert_eq!(kit.heading_font.as_deref(), Some("Playfair Display"));
        assert_eq!(kit.body_font, None);
        assert!(kit.is_active);
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let mut bad = input();
        bad.name = "   ".to_string();
        assert!(matches!(bad.validate(), Err(ModelError::Required("name"))));
    }

    #[test]
    fn test_validate_rejects_bad_colour() {
        let mut bad = input();
        bad.accent_color = "orange".to_string();
        assert!(matches!(
            bad.validate(),
            Err(ModelError::Color {
                field: "accent_color",
                source: ColorError::MissingHash
            })
        ));
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r##"{"name":"Kit","primary_color":"#000","secondary_color":"#111","accent_color":"#222"}"##;
        let parsed: BrandKitInput = serde_json::from_str(json).unwrap();
        assert!(!parsed.is_active);
        assert!(parsed.logo_url.is_none());
        assert!(parsed.validate().is_ok());
    }
}
