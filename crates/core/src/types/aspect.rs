//! Aspect-ratio presets and their render viewports.
//!
//! The renderer sizes both the browser viewport and the document's root
//! container from these presets, so the pixel sizes here are the exact
//! dimensions of the produced image.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when an aspect-ratio string matches no preset.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown aspect ratio '{0}' (expected one of 1:1, 4:5, 9:16, 16:9, 3:4)")]
pub struct UnknownAspectRatio(pub String);

/// Pixel dimensions of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels.
    pub width: u32,
    /// Height in CSS pixels.
    pub height: u32,
}

/// A named aspect-ratio preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AspectRatio {
    /// 1:1, feed posts.
    #[default]
    Square,
    /// 4:5, portrait feed posts.
    Portrait,
    /// 9:16, stories and reels.
    Story,
    /// 16:9, banners and video thumbnails.
    Landscape,
    /// 3:4, printable flyers.
    Flyer,
}

impl AspectRatio {
    /// All presets, in display order.
    pub const ALL: [Self; 5] = [
        Self::Square,
        Self::Portrait,
        Self::Story,
        Self::Landscape,
        Self::Flyer,
    ];

    /// Viewport for this preset.
    #[must_use]
    pub const fn viewport(self) -> Viewport {
        let (width, height) = match self {
            Self::Square => (1080, 1080),
            Self::Portrait => (1080, 1350),
            Self::Story => (1080, 1920),
            Self::Landscape => (1920, 1080),
            Self::Flyer => (1200, 1600),
        };
        Viewport { width, height }
    }

    /// Canonical ratio string (`"1:1"`, `"9:16"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "4:5",
            Self::Story => "9:16",
            Self::Landscape => "16:9",
            Self::Flyer => "3:4",
        }
    }

    /// Human-readable orientation, used when describing the canvas to the model.
    #[must_use]
    pub const fn orientation(self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Portrait | Self::Story | Self::Flyer => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = UnknownAspectRatio;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1:1" | "square" | "instagram" => Ok(Self::Square),
            "4:5" | "portrait" => Ok(Self::Portrait),
            "9:16" | "story" | "reel" => Ok(Self::Story),
            "16:9" | "landscape" | "youtube" => Ok(Self::Landscape),
            "3:4" | "flyer" => Ok(Self::Flyer),
            _ => Err(UnknownAspectRatio(s.to_string())),
        }
    }
}

impl Serialize for AspectRatio {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AspectRatio {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_viewports() {
        let sizes: Vec<(u32, u32)> = AspectRatio::ALL
            .iter()
            .map(|r| (r.viewport().width, r.viewport().height))
            .collect();
        assert_eq!(
            sizes,
            vec![(1080, 1080), (1080, 1350), (1080, 1920), (1920, 1080), (1200, 1600)]
        );
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("square".parse::<AspectRatio>().unwrap(), AspectRatio::Square);
        assert_eq!(" Story ".parse::<AspectRatio>().unwrap(), AspectRatio::Story);
        assert_eq!("16:9".parse::<AspectRatio>().unwrap(), AspectRatio::Landscape);
        assert_eq!("flyer".parse::<AspectRatio>().unwrap(), AspectRatio::Flyer);
        assert!("2:1".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_canonical_string_round_trips() {
        for ratio in AspectRatio::ALL {
            assert_eq!(ratio.as_str().parse::<AspectRatio>().unwrap(), ratio);
        }
    }

    #[test]
    fn test_serde_uses_ratio_string() {
        assert_eq!(
            serde_json::to_string(&AspectRatio::Portrait).unwrap(),
            "\"4:5\""
        );
        let parsed: AspectRatio = serde_json::from_str("\"reel\"").unwrap();
        assert_eq!(parsed, AspectRatio::Story);
        assert!(serde_json::from_str::<AspectRatio>("\"7:3\"").is_err());
    }
}
