//! Brand kit handlers.

use adburst_core::BrandKitId;
use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use super::extract::{ApiJson, ApiPath};
use crate::db::BrandKitRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{BrandKit, BrandKitInput};
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::NotFound("Brand kit not found".to_string())
}

/// GET /api/brand-kits
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<BrandKit>>> {
    let kits = BrandKitRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(kits))
}

/// POST /api/brand-kits
#[instrument(skip(state, input), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<BrandKitInput>,
) -> Result<(StatusCode, Json<BrandKit>)> {
    let new = input.validate()?;
    let kit = BrandKitRepository::new(state.pool()).create(user.id, &new).await?;
    tracing::info!(brand_kit_id = %kit.id, active = kit.is_active, "Brand kit created");
    Ok((StatusCode::CREATED, Json(kit)))
}

/// GET /api/brand-kits/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<BrandKitId>,
) -> Result<Json<BrandKit>> {
    BrandKitRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// PUT /api/brand-kits/{id}
#[instrument(skip(state, input), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<BrandKitId>,
    ApiJson(input): ApiJson<BrandKitInput>,
) -> Result<Json<BrandKit>> {
    let new = input.validate()?;
    BrandKitRepository::new(state.pool())
        .update(user.id, id, &new)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// DELETE /api/brand-kits/{id}
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<BrandKitId>,
) -> Result<StatusCode> {
    if BrandKitRepository::new(state.pool()).delete(user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

/// POST /api/brand-kits/{id}/activate
///
/// Deactivates every other kit the user owns.
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn activate(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<BrandKitId>,
) -> Result<Json<BrandKit>> {
    BrandKitRepository::new(state.pool())
        .activate(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}
