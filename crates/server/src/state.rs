//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::claude::{ClaudeClient, ClaudeError};
use crate::config::ServerConfig;
use crate::render::{BrowserRenderer, Renderer};
use crate::search::SearchClient;
use crate::services::media::MediaStore;
use crate::services::publisher::WebhookPublisher;

/// Timeout for outbound calls other than Claude.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build Claude client: {0}")]
    Claude(#[from] ClaudeError),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    renderer: Renderer,
    media: MediaStore,
    search: Option<SearchClient>,
    publisher: WebhookPublisher,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateError> {
        let claude = ClaudeClient::new(config.claude())?;
        let renderer = Renderer::new(claude, BrowserRenderer::new(&config.render));
        let media = MediaStore::new(&config.render.media_dir, &config.base_url);

        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let search = config
            .search()
            .map(|search| SearchClient::new(http.clone(), search));
        let publisher = WebhookPublisher::new(http, HTTP_TIMEOUT);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                renderer,
                media,
                search,
                publisher,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Prompt-to-image pipeline.
    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.inner.renderer
    }

    #[must_use]
    pub fn media(&self) -> &MediaStore {
        &self.inner.media
    }

    /// Inspiration search, if configured.
    #[must_use]
    pub fn search(&self) -> Option<&SearchClient> {
        self.inner.search.as_ref()
    }

    #[must_use]
    pub fn publisher(&self) -> &WebhookPublisher {
        &self.inner.publisher
    }
}
