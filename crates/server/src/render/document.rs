//! Static HTML documents handed to the browser.

use std::sync::LazyLock;

use adburst_core::Viewport;
use askama::Template;
use regex::Regex;

use super::RenderError;
use super::extract::ExtractedDesign;

/// `<script>` elements, including unterminated trailing ones.
static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?(?:</script\s*>|$)").expect("Invalid regex")
});

/// Closing style tag, which would end the embedded stylesheet early.
static STYLE_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</style\s*>").expect("Invalid regex"));

/// A generated design laid out on its canvas.
#[derive(Template)]
#[template(path = "render/design.html")]
pub struct DesignDocument<'a> {
    pub width: u32,
    pub height: u32,
    pub html: String,
    pub css: String,
    pub background_image_url: Option<&'a str>,
    pub logo_url: Option<&'a str>,
}

impl<'a> DesignDocument<'a> {
    /// Lay out `design` on a canvas of `viewport` size.
    #[must_use]
    pub fn new(
        design: &ExtractedDesign,
        viewport: Viewport,
        background_image_url: Option<&'a str>,
        logo_url: Option<&'a str>,
    ) -> Self {
        Self {
            width: viewport.width,
            height: viewport.height,
            html: sanitize_html(&design.html),
            css: STYLE_CLOSE_RE.replace_all(&design.css, "").into_owned(),
            background_image_url,
            logo_url,
        }
    }
}

/// The error card shown when no design could be produced.
#[derive(Template)]
#[template(path = "render/fallback.html")]
pub struct FallbackDocument<'a> {
    pub width: u32,
    pub height: u32,
    pub message: &'a str,
}

impl<'a> FallbackDocument<'a> {
    #[must_use]
    pub const fn new(viewport: Viewport, message: &'a str) -> Self {
        Self {
            width: viewport.width,
            height: viewport.height,
            message,
        }
    }
}

/// Drop script elements from model markup.
#[must_use]
pub fn sanitize_html(html: &str) -> String {
    SCRIPT_RE.replace_all(html, "").into_owned()
}

/// Render a template into a complete document string.
///
/// # Errors
///
/// Returns `RenderError::Template` if askama fails.
pub fn render_document(template: &impl Template) -> Result<String, RenderError> {
    Ok(template.render()?)
}
