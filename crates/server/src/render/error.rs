//! Render pipeline errors.

use std::time::Duration;

use thiserror::Error;

/// Errors that stop a render from producing any image.
///
/// Model failures and failed design captures are not represented here: they
/// produce a fallback image instead (see [`super::RenderOutcome::Fallback`]).
#[derive(Debug, Error)]
pub enum RenderError {
    /// The document template failed to render.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// Temp file creation or writing failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The headless browser failed to launch or capture.
    #[error("browser error: {0}")]
    Browser(String),

    /// The capture did not finish in time.
    #[error("render timed out after {0:?}")]
    Timeout(Duration),
}

impl From<chromiumoxide::error::CdpError> for RenderError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Self::Browser(err.to_string())
    }
}
