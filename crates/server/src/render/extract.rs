//! Parsing the model's reply into HTML/CSS.
//!
//! The model is asked for a bare JSON object, but replies drift: fenced
//! blocks, prose around the object, or plain markup. Each fallback below
//! accepts one of those shapes; only a reply none of them can read is an
//! error.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// Fenced block, optionally tagged `json`, holding an object.
static FENCED_JSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").expect("Invalid regex")
});

/// Fenced block tagged `html`.
static FENCED_HTML_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:html|HTML)\s*(.*?)```").expect("Invalid regex"));

/// Inline `<style>` element.
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>(.*?)</style>").expect("Invalid regex"));

/// First top-level heading.
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h[12][^>]*>(.*?)</h[12]>").expect("Invalid regex"));

/// Any tag, for stripping markup from text.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("Invalid regex"));

/// A design extracted from a model reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtractedDesign {
    /// Body markup, without `<html>`/`<head>`.
    pub html: String,
    /// Stylesheet applied alongside Tailwind.
    #[serde(default)]
    pub css: String,
    /// Main headline of the design.
    #[serde(default)]
    pub headline: Option<String>,
    /// Supporting copy.
    #[serde(default)]
    pub content: Option<String>,
}

/// Which fallback produced the design; logged for prompt tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    DirectJson,
    EmbeddedJson,
    Html,
}

/// The reply contained nothing usable.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("model reply contained no recognizable design")]
pub struct MalformedReply;

/// Extract a design from a model reply.
///
/// # Errors
///
/// Returns `MalformedReply` when neither JSON nor markup can be found.
pub fn extract_design(reply: &str) -> Result<(ExtractedDesign, ExtractionPath), MalformedReply> {
    let reply = reply.trim();

    if let Some(design) = parse_json(reply) {
        return Ok((design, ExtractionPath::DirectJson));
    }

    if let Some(design) = embedded_json(reply).and_then(parse_json) {
        return Ok((design, ExtractionPath::EmbeddedJson));
    }

    if let Some(design) = embedded_html(reply) {
        return Ok((design, ExtractionPath::Html));
    }

    Err(MalformedReply)
}

/// Parse a JSON object into a design with non-empty markup.
fn parse_json(candidate: &str) -> Option<ExtractedDesign> {
    let mut design: ExtractedDesign = serde_json::from_str(candidate).ok()?;
    if design.html.trim().is_empty() {
        return None;
    }
    design.headline = clean_text(design.headline.as_deref());
    design.content = clean_text(design.content.as_deref());
    Some(design)
}

/// Locate a JSON object inside surrounding prose.
fn embedded_json(reply: &str) -> Option<&str> {
    if let Some(captures) = FENCED_JSON_RE.captures(reply) {
        return captures.get(1).map(|m| m.as_str());
    }
    outermost(reply, "{", "}")
}

/// Locate markup and split its inline styles into CSS.
fn embedded_html(reply: &str) -> Option<ExtractedDesign> {
    let markup = FENCED_HTML_RE
        .captures(reply)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|m| !m.is_empty())
        .or_else(|| outermost(reply, "<div", "</div>"))?;

    let css = STYLE_RE
        .captures_iter(markup)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let html = STYLE_RE.replace_all(markup, "").trim().to_string();
    if html.is_empty() {
        return None;
    }

    let headline = HEADING_RE
        .captures(&html)
        .and_then(|c| c.get(1))
        .and_then(|m| clean_text(Some(&TAG_RE.replace_all(m.as_str(), " "))));

    Some(ExtractedDesign {
        html,
        css,
        headline,
        content: None,
    })
}

/// Span from the first `open` to the end of the last `close`, if ordered.
fn outermost<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = text.find(open)?;
    let end = text.rfind(close)? + close.len();
    text.get(start..end).filter(|_| end > start)
}

/// Collapse whitespace; blank becomes `None`.
fn clean_text(text: Option<&str>) -> Option<String> {
    let collapsed = text?.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_json() {
        let reply = r#"{"html": "<div class=\"flyer\">Hi</div>", "css": ".flyer{color:red}", "headline": "  Grand   Opening ", "content": "Join us"}"#;
        let (design, path) = extract_design(reply).unwrap();
        assert_eq!(path, ExtractionPath::DirectJson);
        assert_eq!(design.css, ".flyer{color:red}");
        assert_eq!(design.headline.as_deref(), Some("Grand Opening"));
        assert_eq!(design.content.as_deref(), Some("Join us"));
    }

    #[test]
    fn test_fenced_json() {
        let reply = "Here is your flyer:\n```json\n{\"html\": \"<div>A</div>\", \"css\": \"\"}\n```\nEnjoy!";
        let (design, path) = extract_design(reply).unwrap();
        assert_eq!(path, ExtractionPath::EmbeddedJson);
        assert_eq!(design.html, "<div>A</div>");
        assert!(design.headline.is_none());
    }

    #[test]
    fn test_json_inside_prose() {
        let reply = "Sure! {\"html\": \"<div>{{braces}}</div>\"} Let me know.";
        let (design, path) = extract_design(reply).unwrap();
        assert_eq!(path, ExtractionPath::EmbeddedJson);
        assert_eq!(design.html, "<div>{{braces}}</div>");
        assert_eq!(design.css, "");
    }

    #[test]
    fn test_html_fallback_lifts_styles() {
        let reply = "```html\n<style>.flyer { background: #000; }</style>\n<div class=\"flyer\"><h1>Summer <b>Sale</b></h1></div>\n```";
        let (design, path) = extract_design(reply).unwrap();
        assert_eq!(path, ExtractionPath::Html);
        assert_eq!(design.css, ".flyer { background: #000; }");
        assert_eq!(design.html, "<div class=\"flyer\"><h1>Summer <b>Sale</b></h1></div>");
        assert_eq!(design.headline.as_deref(), Some("Summer Sale"));
    }

    #[test]
    fn test_bare_div_fallback() {
        let reply = "I made this: <div class=\"design-container\"><div>Inner</div></div> hope it helps";
        let (design, path) = extract_design(reply).unwrap();
        assert_eq!(path, ExtractionPath::Html);
        assert_eq!(
            design.html,
            "<div class=\"design-container\"><div>Inner</div></div>"
        );
    }

    #[test]
    fn test_json_with_empty_html_falls_through() {
        assert_eq!(
            extract_design(r#"{"html": "   ", "css": "body{}"}"#),
            Err(MalformedReply)
        );
    }

    #[test]
    fn test_malformed_reply() {
        assert_eq!(
            extract_design("I'm sorry, I can't help with that."),
            Err(MalformedReply)
        );
        assert_eq!(extract_design("</div> backwards <div"), Err(MalformedReply));
        assert_eq!(extract_design(""), Err(MalformedReply));
    }
}
