//! Public views of shared creations.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Json, extract::State};
use tracing::instrument;

use super::extract::ApiPath;
use crate::db::CreationRepository;
use crate::error::{AppError, Result};
use crate::models::SharedCreation;
use crate::state::AppState;

/// Public share page with Open Graph tags.
#[derive(Template, WebTemplate)]
#[template(path = "share/page.html")]
pub struct SharePageTemplate {
    pub creation: SharedCreation,
    pub title: String,
    pub page_url: String,
    pub width: u32,
    pub height: u32,
}

async fn load(state: &AppState, token: &str) -> Result<SharedCreation> {
    CreationRepository::new(state.pool())
        .get_shared(token)
        .await?
        .map(SharedCreation::from)
        .ok_or_else(|| AppError::NotFound("Shared design not found".to_string()))
}

/// GET /api/share/{token}
pub async fn show_json(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
) -> Result<Json<SharedCreation>> {
    load(&state, &token).await.map(Json)
}

/// GET /share/{token}
#[instrument(skip(state))]
pub async fn show_page(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
) -> Result<SharePageTemplate> {
    let creation = load(&state, &token).await?;
    let viewport = creation.aspect_ratio.viewport();
    let title = creation
        .headline
        .clone()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "A design made with AdBurst".to_string());

    Ok(SharePageTemplate {
        title,
        page_url: state.config().public_url(&format!("/share/{token}")),
        width: viewport.width,
        height: viewport.height,
        creation,
    })
}
