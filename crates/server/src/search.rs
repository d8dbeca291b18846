//! Competitor-ad inspiration search via Google Custom Search.
//!
//! Image search results are mapped to [`CompetitorAdInput`] candidates the
//! client can save. Results are cached per `(query, limit)` for 10 minutes.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::SearchConfig;
use crate::models::CompetitorAdInput;

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Google caps a single request at 10 results.
pub const MAX_RESULTS: u8 = 10;

/// Errors from the search API.
#[derive(Debug, Error)]
pub enum SearchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status.
    #[error("search API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The query was empty.
    #[error("search query is required")]
    EmptyQuery,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    #[serde(default)]
    title: String,
    link: Option<String>,
    display_link: Option<String>,
    snippet: Option<String>,
    image: Option<SearchImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchImage {
    context_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchErrorBody {
    error: SearchErrorDetail,
}

#[derive(Debug, Deserialize)]
struct SearchErrorDetail {
    message: String,
}

/// Client for Google Custom Search image queries.
#[derive(Clone)]
pub struct SearchClient {
    inner: Arc<SearchClientInner>,
}

struct SearchClientInner {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
    cache: Cache<(String, u8), Vec<CompetitorAdInput>>,
}

impl SearchClient {
    #[must_use]
    pub fn new(client: reqwest::Client, config: &SearchConfig) -> Self {
        Self::with_endpoint(client, config, SEARCH_ENDPOINT)
    }

    /// Create a client against a non-default endpoint.
    #[must_use]
    pub fn with_endpoint(client: reqwest::Client, config: &SearchConfig, endpoint: &str) -> Self {
        let cache = Cache::builder()
            .max_capacity(500)
            .time_to_live(Duration::from_secs(600))
            .build();

        Self {
            inner: Arc::new(SearchClientInner {
                client,
                endpoint: endpoint.to_string(),
                api_key: config.api_key.expose_secret().to_string(),
                engine_id: config.engine_id.clone(),
                cache,
            }),
        }
    }

    /// Search for ad images matching `query`.
    ///
    /// `limit` is clamped to `1..=10`.
    ///
    /// # Errors
    ///
    /// Returns `SearchError` if the query is blank or the API call fails.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: u8) -> Result<Vec<CompetitorAdInput>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let limit = limit.clamp(1, MAX_RESULTS);
        let cache_key = (query.to_lowercase(), limit);

        if let Some(results) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for inspiration search");
            return Ok(results);
        }

        let limit_param = limit.to_string();
        let response = self
            .inner
            .client
            .get(&self.inner.endpoint)
            .query(&[
                ("key", self.inner.api_key.as_str()),
                ("cx", self.inner.engine_id.as_str()),
                ("q", query),
                ("searchType", "image"),
                ("num", limit_param.as_str()),
                ("safe", "active"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<SearchErrorBody>(&body)
                .map_or_else(|_| status.to_string(), |b| b.error.message);
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = response.json().await?;
        let results: Vec<CompetitorAdInput> = body
            .items
            .into_iter()
            .map(|item| to_candidate(item, query))
            .collect();

        debug!(count = results.len(), "Inspiration search returned results");
        self.inner.cache.insert(cache_key, results.clone()).await;
        Ok(results)
    }
}

fn to_candidate(item: SearchItem, query: &str) -> CompetitorAdInput {
    let source_url = item.image.and_then(|image| image.context_link);
    let platform = source_url
        .as_deref()
        .or(item.display_link.as_deref())
        .and_then(platform_for);

    CompetitorAdInput {
        title: if item.title.trim().is_empty() {
            query.to_string()
        } else {
            item.title
        },
        advertiser: item.display_link,
        description: item.snippet,
        image_url: item.link,
        source_url,
        platform: platform.map(str::to_string),
        search_query: Some(query.to_string()),
    }
}

/// Recognize ad platforms from a result's host.
fn platform_for(link: &str) -> Option<&'static str> {
    let host = url::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| link.to_lowercase());

    [
        ("facebook.com", "facebook"),
        ("instagram.com", "instagram"),
        ("twitter.com", "twitter"),
        ("x.com", "twitter"),
        ("linkedin.com", "linkedin"),
        ("pinterest.com", "pinterest"),
        ("tiktok.com", "tiktok"),
    ]
    .into_iter()
    .find(|(domain, _)| host == *domain || host.ends_with(&format!(".{domain}")))
    .map(|(_, platform)| platform)
}
