//! Headless Chromium screenshots.
//!
//! One browser is launched per capture and torn down before returning, on
//! success, failure and timeout alike. The document is written to a temp
//! file that is removed when the capture's guard drops.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use adburst_core::Viewport;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::handler::viewport::Viewport as BrowserViewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tempfile::NamedTempFile;
use tokio::task::JoinHandle;
use tracing::instrument;

use super::RenderError;
use crate::config::RenderConfig;

/// Elements tried, in order, as the capture target before falling back to
/// the full page.
pub const SCREENSHOT_SELECTORS: [&str; 4] =
    [".flyer-container", ".flyer", ".design-container", "#flyer-root"];

/// Launches a browser per capture.
#[derive(Debug, Clone)]
pub struct BrowserRenderer {
    chrome_executable: Option<PathBuf>,
    settle_delay: Duration,
    timeout: Duration,
}

impl BrowserRenderer {
    #[must_use]
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            chrome_executable: config.chrome_executable.clone(),
            settle_delay: config.settle_delay,
            timeout: config.timeout,
        }
    }

    /// Screenshot `document` at `viewport` size, returning PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Io` if the temp file cannot be written,
    /// `RenderError::Browser` if Chromium fails, and `RenderError::Timeout`
    /// if the whole capture exceeds the configured timeout.
    #[instrument(skip(self, document), fields(width = viewport.width, height = viewport.height))]
    pub async fn screenshot(&self, document: &str, viewport: Viewport) -> Result<Vec<u8>, RenderError> {
        let mut file = tempfile::Builder::new()
            .prefix("adburst-")
            .suffix(".html")
            .tempfile()?;
        file.write_all(document.as_bytes())?;
        file.flush()?;

        let (browser, handler_task) = self.launch(viewport).await?;
        let mut session = BrowserSession {
            browser,
            handler_task,
            document: file,
        };

        let capture = tokio::time::timeout(self.timeout, self.capture(&session, viewport)).await;
        session.close().await;

        match capture {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "Render timed out");
                Err(RenderError::Timeout(self.timeout))
            }
        }
    }

    async fn launch(&self, viewport: Viewport) -> Result<(Browser, JoinHandle<()>), RenderError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(viewport.width, viewport.height)
            .viewport(BrowserViewport {
                width: viewport.width,
                height: viewport.height,
                device_scale_factor: Some(1.0),
                emulating_mobile: false,
                is_landscape: viewport.width > viewport.height,
                has_touch: false,
            })
            .launch_timeout(self.timeout)
            .request_timeout(self.timeout)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--hide-scrollbars");

        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let config = builder.build().map_err(RenderError::Browser)?;
        let (browser, mut handler) = Browser::launch(config).await?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok((browser, handler_task))
    }

    async fn capture(&self, session: &BrowserSession, viewport: Viewport) -> Result<Vec<u8>, RenderError> {
        let url = document_url(session.document.path())?;
        let page = session.browser.new_page(url.as_str()).await?;
        page.wait_for_navigation().await?;

        // Tailwind compiles classes after load; give it and web fonts time.
        tokio::time::sleep(self.settle_delay).await;

        let png = screenshot_target(&page).await?;
        tracing::debug!(bytes = png.len(), width = viewport.width, "Captured screenshot");
        Ok(png)
    }
}

/// Percent-encoded `file://` URL for an absolute document path.
fn document_url(path: &Path) -> Result<String, RenderError> {
    url::Url::from_file_path(path)
        .map(String::from)
        .map_err(|()| RenderError::Browser(format!("not an absolute path: {}", path.display())))
}

/// Capture the first matching selector, else the full page.
async fn screenshot_target(page: &Page) -> Result<Vec<u8>, RenderError> {
    for selector in SCREENSHOT_SELECTORS {
        if let Ok(element) = page.find_element(selector).await {
            tracing::debug!(selector, "Capturing element");
            return Ok(element.screenshot(CaptureScreenshotFormat::Png).await?);
        }
    }

    tracing::debug!("No design element found, capturing full page");
    let params = ScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Png)
        .full_page(true)
        .build();
    Ok(page.screenshot(params).await?)
}

/// A launched browser plus the resources scoped to one capture.
struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    document: NamedTempFile,
}

impl BrowserSession {
    async fn close(&mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!(error = %e, "Failed to close browser");
        }
        if let Err(e) = self.browser.wait().await {
            tracing::warn!(error = %e, "Failed to reap browser process");
        }
        self.handler_task.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_document_url_is_encoded() {
        let url = document_url(Path::new("/tmp/my renders/adburst-#1.html")).unwrap();
        assert_eq!(url, "file:///tmp/my%20renders/adburst-%231.html");
    }

    #[test]
    fn test_document_url_rejects_relative_path() {
        assert!(matches!(
            document_url(Path::new("renders/doc.html")),
            Err(RenderError::Browser(_))
        ));
    }
}
