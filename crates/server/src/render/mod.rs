//! Prompt-to-image rendering.
//!
//! A render walks a fixed chain: build the prompt, ask Claude for markup,
//! parse the reply, splice it into a static document, and screenshot that
//! document in a headless browser. Failures along the way (upstream errors,
//! a reply none of the parsers can read, a design the browser cannot
//! capture) do not fail the render; they produce a fallback image carrying a
//! friendly message instead.
//!
//! [`plan`] and [`recovery_plan`] are the pure halves of the chain, so the
//! fallback logic is testable without a browser.

mod browser;
mod document;
mod error;
pub mod extract;
pub mod friendly;
pub mod prompt;

use adburst_core::AspectRatio;
use tracing::instrument;

pub use browser::{BrowserRenderer, SCREENSHOT_SELECTORS};
pub use document::{DesignDocument, FallbackDocument, render_document, sanitize_html};
pub use error::RenderError;
pub use extract::{ExtractedDesign, ExtractionPath, MalformedReply, extract_design};
pub use friendly::FailureKind;

use crate::claude::{ClaudeClient, ClaudeError};
use crate::models::{BrandKit, CompetitorAd};

/// Everything the model and the document need to produce one design.
#[derive(Debug, Clone, Copy)]
pub struct DesignBrief<'a> {
    pub prompt: &'a str,
    pub aspect_ratio: AspectRatio,
    pub template_id: Option<&'a str>,
    pub brand_kit: Option<&'a BrandKit>,
    pub inspiration: &'a [CompetitorAd],
    pub background_image_url: Option<&'a str>,
    pub logo_url: Option<&'a str>,
}

impl<'a> DesignBrief<'a> {
    /// Explicit logo, else the brand kit's logo.
    #[must_use]
    pub fn effective_logo_url(&self) -> Option<&'a str> {
        self.logo_url
            .or_else(|| self.brand_kit.and_then(|kit| kit.logo_url.as_deref()))
    }
}

/// A complete document ready for the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentPlan {
    /// The model produced a usable design.
    Design {
        document: String,
        design: ExtractedDesign,
        path: ExtractionPath,
    },
    /// The model failed; render the error card.
    Fallback { document: String, kind: FailureKind },
}

impl DocumentPlan {
    /// The HTML handed to the browser.
    #[must_use]
    pub fn document(&self) -> &str {
        match self {
            Self::Design { document, .. } | Self::Fallback { document, .. } => document,
        }
    }
}

/// Turn a model reply (or its failure) into a document.
///
/// # Errors
///
/// Returns `RenderError::Template` only if a template fails to render.
pub fn plan(
    brief: &DesignBrief<'_>,
    reply: Result<String, ClaudeError>,
) -> Result<DocumentPlan, RenderError> {
    let viewport = brief.aspect_ratio.viewport();

    let kind = match reply {
        Ok(text) => match extract_design(&text) {
            Ok((design, path)) => {
                let document = render_document(&DesignDocument::new(
                    &design,
                    viewport,
                    brief.background_image_url,
                    brief.effective_logo_url(),
                ))?;
                return Ok(DocumentPlan::Design {
                    document,
                    design,
                    path,
                });
            }
            Err(MalformedReply) => {
                tracing::warn!(reply_len = text.len(), "Model reply had no recognizable design");
                FailureKind::Malformed
            }
        },
        Err(e) => {
            let kind = FailureKind::from_claude(&e);
            tracing::warn!(error = %e, kind = kind.as_str(), "Design generation failed");
            kind
        }
    };

    fallback_plan(brief.aspect_ratio, kind)
}

/// The error card for `kind` at the preset's size.
///
/// # Errors
///
/// Returns `RenderError::Template` if the fallback template fails to render.
pub fn fallback_plan(aspect_ratio: AspectRatio, kind: FailureKind) -> Result<DocumentPlan, RenderError> {
    let document = render_document(&FallbackDocument::new(aspect_ratio.viewport(), kind.message()))?;
    Ok(DocumentPlan::Fallback { document, kind })
}

/// What to capture after `failed` could not be screenshotted.
///
/// A design gets one more attempt as the generic error card. A fallback
/// that failed has nothing left to fall back to, so this returns `None`.
///
/// # Errors
///
/// Returns `RenderError::Template` if the fallback template fails to render.
pub fn recovery_plan(
    failed: &DocumentPlan,
    aspect_ratio: AspectRatio,
) -> Result<Option<DocumentPlan>, RenderError> {
    match failed {
        DocumentPlan::Design { .. } => fallback_plan(aspect_ratio, FailureKind::Generic).map(Some),
        DocumentPlan::Fallback { .. } => Ok(None),
    }
}

/// Result of a render: an image either way.
#[derive(Debug, Clone)]
pub enum RenderOutcome {
    Design {
        png: Vec<u8>,
        headline: Option<String>,
        content: Option<String>,
        html: String,
        css: String,
    },
    Fallback {
        png: Vec<u8>,
        kind: FailureKind,
    },
}

/// Claude plus a browser: the whole chain.
#[derive(Clone)]
pub struct Renderer {
    claude: ClaudeClient,
    browser: BrowserRenderer,
}

impl Renderer {
    #[must_use]
    pub const fn new(claude: ClaudeClient, browser: BrowserRenderer) -> Self {
        Self { claude, browser }
    }

    /// Render a brief to an image.
    ///
    /// # Errors
    ///
    /// Returns `RenderError` only if even the fallback card cannot be built
    /// or captured. Model failures and design capture failures yield
    /// `Ok(RenderOutcome::Fallback)`.
    #[instrument(skip(self, brief), fields(aspect_ratio = %brief.aspect_ratio))]
    pub async fn render(&self, brief: &DesignBrief<'_>) -> Result<RenderOutcome, RenderError> {
        let reply = self
            .claude
            .generate_design(&prompt::system_prompt(brief), &prompt::user_prompt(brief))
            .await;

        let viewport = brief.aspect_ratio.viewport();
        let plan = plan(brief, reply)?;
        let png = match self.browser.screenshot(plan.document(), viewport).await {
            Ok(png) => png,
            Err(e) => {
                let Some(recovery) = recovery_plan(&plan, brief.aspect_ratio)? else {
                    return Err(e);
                };
                tracing::warn!(error = %e, "Design capture failed, rendering fallback card");
                let png = self.browser.screenshot(recovery.document(), viewport).await?;
                return Ok(RenderOutcome::Fallback {
                    png,
                    kind: FailureKind::Generic,
                });
            }
        };

        Ok(match plan {
            DocumentPlan::Design { design, path, .. } => {
                tracing::info!(?path, bytes = png.len(), "Rendered design");
                RenderOutcome::Design {
                    png,
                    headline: design.headline,
                    content: design.content,
                    html: design.html,
                    css: design.css,
                }
            }
            DocumentPlan::Fallback { kind, .. } => RenderOutcome::Fallback { png, kind },
        })
    }
}
