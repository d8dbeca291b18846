//! Competitor-ad inspiration: image search and the saved list.

use adburst_core::CompetitorAdId;
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::db::CompetitorAdRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CompetitorAd, CompetitorAdInput};
use crate::search::MAX_RESULTS;
use crate::state::AppState;

/// Query parameters for `GET /api/ad-inspiration/search`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<u8>,
}

/// GET /api/ad-inspiration/search
#[instrument(skip(state, query), fields(user_id = %user.id))]
pub async fn search(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<CompetitorAdInput>>> {
    let client = state
        .search()
        .ok_or_else(|| AppError::ServiceUnavailable("Ad search is not configured".to_string()))?;
    let results = client
        .search(&query.q, query.limit.unwrap_or(MAX_RESULTS))
        .await?;
    Ok(Json(results))
}

/// GET /api/ad-inspiration/saved
pub async fn list_saved(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<CompetitorAd>>> {
    let ads = CompetitorAdRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(ads))
}

/// POST /api/ad-inspiration/saved
#[instrument(skip(state, input), fields(user_id = %user.id))]
pub async fn save(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<CompetitorAdInput>,
) -> Result<(StatusCode, Json<CompetitorAd>)> {
    let input = input.validate()?;
    let ad = CompetitorAdRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(ad)))
}

/// DELETE /api/ad-inspiration/saved/{id}
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn delete_saved(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CompetitorAdId>,
) -> Result<StatusCode> {
    if CompetitorAdRepository::new(state.pool()).delete(user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Saved ad not found".to_string()))
    }
}
