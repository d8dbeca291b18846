//! Creation library handlers: listing, editing and sharing.

use adburst_core::{CreationId, CreationKind};
use axum::{Json, extract::State, http::StatusCode};
use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::db::CreationRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Creation, CreationUpdate};
use crate::state::AppState;

/// Length of a share token.
pub const SHARE_TOKEN_LEN: usize = 24;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Query parameters for creation listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub kind: Option<String>,
}

impl ListQuery {
    /// Clamped `(limit, offset)`.
    #[must_use]
    pub fn page(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }

    fn kind(&self) -> Result<Option<CreationKind>> {
        self.kind
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(str::parse)
            .transpose()
            .map_err(|e: adburst_core::InvalidVariant| AppError::BadRequest(e.to_string()))
    }
}

/// Response for share token creation.
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub share_token: String,
    pub share_url: String,
}

/// Random alphanumeric share token.
#[must_use]
pub fn generate_share_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SHARE_TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn not_found() -> AppError {
    AppError::NotFound("Creation not found".to_string())
}

/// GET /api/creations
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Creation>>> {
    let kind = query.kind()?;
    let (limit, offset) = query.page();
    let creations = CreationRepository::new(state.pool())
        .list(user.id, kind, limit, offset)
        .await?;
    Ok(Json(creations))
}

/// GET /api/my-flyers
pub async fn my_flyers(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Creation>>> {
    let (limit, offset) = query.page();
    let creations = CreationRepository::new(state.pool())
        .list(user.id, Some(CreationKind::Flyer), limit, offset)
        .await?;
    Ok(Json(creations))
}

/// GET /api/creations/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CreationId>,
) -> Result<Json<Creation>> {
    CreationRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// PUT /api/creations/{id}
#[instrument(skip(state, update), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CreationId>,
    ApiJson(update): ApiJson<CreationUpdate>,
) -> Result<Json<Creation>> {
    let update = update.validate()?;
    CreationRepository::new(state.pool())
        .update(user.id, id, &update)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// DELETE /api/creations/{id}
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CreationId>,
) -> Result<StatusCode> {
    if CreationRepository::new(state.pool()).delete(user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

/// POST /api/creations/{id}/share
///
/// Returns the existing token when the creation is already shared.
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn share(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CreationId>,
) -> Result<Json<ShareResponse>> {
    let token = CreationRepository::new(state.pool())
        .share(user.id, id, &generate_share_token())
        .await?
        .ok_or_else(not_found)?;
    let share_url = state.config().public_url(&format!("/share/{token}"));
    Ok(Json(ShareResponse {
        share_token: token,
        share_url,
    }))
}

/// DELETE /api/creations/{id}/share
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn unshare(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CreationId>,
) -> Result<StatusCode> {
    if CreationRepository::new(state.pool()).unshare(user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}
