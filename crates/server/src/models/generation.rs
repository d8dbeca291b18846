//! Generation requests and results.

use adburst_core::{AspectRatio, BrandKitId, CompetitorAdId};
use serde::{Deserialize, Serialize};

use super::{Creation, ModelError, optional_image_url, optional_text, required_text};

/// Longest accepted prompt, in characters.
pub const MAX_PROMPT_LEN: usize = 4000;

/// Most variations a single burst may request.
pub const MAX_VARIATIONS: usize = 4;

/// Presets rendered by a burst that names neither ratios nor a count.
pub const DEFAULT_BURST: [AspectRatio; 4] = [
    AspectRatio::Square,
    AspectRatio::Portrait,
    AspectRatio::Story,
    AspectRatio::Landscape,
];

/// Request body for `POST /api/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub brand_kit_id: Option<BrandKitId>,
    #[serde(default)]
    pub inspiration_ids: Vec<CompetitorAdId>,
    #[serde(default)]
    pub background_image_url: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// A validated generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub template_id: Option<String>,
    pub brand_kit_id: Option<BrandKitId>,
    pub inspiration_ids: Vec<CompetitorAdId>,
    pub background_image_url: Option<String>,
    pub logo_url: Option<String>,
}

impl GenerateRequest {
    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` for a blank or overlong prompt, an unknown aspect
    /// ratio or a non-http(s) image URL.
    pub fn validate(self) -> Result<Generation, ModelError> {
        let prompt = required_text("prompt", &self.prompt, MAX_PROMPT_LEN)?;
        let aspect_ratio = parse_ratio(self.aspect_ratio.as_deref())?;

        let mut inspiration_ids = self.inspiration_ids;
        inspiration_ids.sort_unstable();
        inspiration_ids.dedup();

        Ok(Generation {
            prompt,
            aspect_ratio,
            template_id: optional_text("template_id", self.template_id.as_deref(), 50)?,
            brand_kit_id: self.brand_kit_id,
            inspiration_ids,
            background_image_url: optional_image_url(
                "background_image_url",
                self.background_image_url.as_deref(),
            )?,
            logo_url: optional_image_url("logo_url", self.logo_url.as_deref())?,
        })
    }
}

/// Request body for `POST /api/adburst`.
///
/// `aspect_ratios` renders one variation per distinct ratio; otherwise
/// `variations` repeats the base ratio; with neither, [`DEFAULT_BURST`] is used.
#[derive(Debug, Clone, Deserialize)]
pub struct AdBurstRequest {
    #[serde(flatten)]
    pub base: GenerateRequest,
    #[serde(default)]
    pub aspect_ratios: Vec<String>,
    #[serde(default)]
    pub variations: Option<usize>,
}

impl AdBurstRequest {
    /// Validate the request into one generation per variation.
    ///
    /// # Errors
    ///
    /// Returns `ModelError` if the base request is invalid, a ratio is unknown,
    /// or the variation count is outside `1..=4`.
    pub fn validate(self) -> Result<Vec<Generation>, ModelError> {
        let explicit_ratio = self.base.aspect_ratio.is_some();
        let base = self.base.validate()?;

        let ratios = if !self.aspect_ratios.is_empty() {
            let mut ratios: Vec<AspectRatio> = Vec::with_capacity(self.aspect_ratios.len());
            for raw in &self.aspect_ratios {
                let ratio = parse_ratio(Some(raw))?;
                if !ratios.contains(&ratio) {
                    ratios.push(ratio);
                }
            }
            ratios
        } else if let Some(count) = self.variations {
            vec![base.aspect_ratio; count.min(MAX_VARIATIONS + 1)]
        } else if explicit_ratio {
            vec![base.aspect_ratio]
        } else {
            DEFAULT_BURST.to_vec()
        };

        if ratios.is_empty() || ratios.len() > MAX_VARIATIONS {
            return Err(ModelError::Invalid(format!(
                "variations must be between 1 and {MAX_VARIATIONS}"
            )));
        }

        Ok(ratios
            .into_iter()
            .map(|aspect_ratio| Generation {
                aspect_ratio,
                ..base.clone()
            })
            .collect())
    }
}

fn parse_ratio(raw: Option<&str>) -> Result<AspectRatio, ModelError> {
    raw.map_or(Ok(AspectRatio::default()), |raw| {
        raw.parse()
            .map_err(|e: adburst_core::UnknownAspectRatio| ModelError::Invalid(e.to_string()))
    })
}

/// Outcome of one generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    /// True when the model failed and `image_url` shows an error card.
    pub fallback: bool,
    pub image_url: String,
    pub aspect_ratio: AspectRatio,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation: Option<Creation>,
    /// Friendly failure message, set on fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Failure category, set on fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<&'static str>,
    pub credits_remaining: i32,
}

/// Outcome of a burst.
#[derive(Debug, Clone, Serialize)]
pub struct AdBurstResult {
    pub requested: usize,
    pub variations: Vec<GenerationResult>,
    /// True when the burst stopped because credits ran out.
    pub stopped_early: bool,
    pub credits_remaining: i32,
}
