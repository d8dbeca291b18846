//! Credit balance handler.

use axum::{Json, extract::State};

use crate::db::{CreditRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::CreditSummary;
use crate::state::AppState;

const RECENT_TRANSACTIONS: i64 = 20;

/// GET /api/credits
pub async fn summary(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<CreditSummary>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Session user no longer exists".to_string()))?;
    let transactions = CreditRepository::new(state.pool())
        .list_recent(user.id, RECENT_TRANSACTIONS)
        .await?;

    Ok(Json(CreditSummary {
        credits: user.credits,
        tier: user.tier,
        max_variations: user.tier.max_variations(),
        generation_cost: state.config().credits.generation_cost,
        transactions,
    }))
}
