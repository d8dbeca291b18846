//! Generation handlers.
//!
//! Both endpoints answer 200 even when the model fails: the result then
//! carries `fallback: true` and an error card image instead of a creation.

use adburst_core::CreationKind;
use axum::{Json, extract::State};
use tracing::instrument;

use super::extract::ApiJson;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{AdBurstRequest, AdBurstResult, GenerateRequest, GenerationResult};
use crate::services::generation;
use crate::state::AppState;

/// POST /api/generate
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn generate(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<GenerateRequest>,
) -> Result<Json<GenerationResult>> {
    let generation = request.validate()?;
    let result = generation::generate(&state, user.id, &generation, CreationKind::Flyer).await?;
    Ok(Json(result))
}

/// POST /api/adburst
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn adburst(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<AdBurstRequest>,
) -> Result<Json<AdBurstResult>> {
    let generations = request.validate()?;
    let result = generation::adburst(&state, user.id, &generations).await?;
    Ok(Json(result))
}
