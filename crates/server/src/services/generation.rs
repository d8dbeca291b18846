//! Design generation: credits, context resolution, rendering and storage.
//!
//! A successful render is stored under the media directory, then inserted
//! and charged in one transaction. A fallback render (model failure) stores
//! only the error card; nothing is persisted and nothing is charged.

use adburst_core::{AspectRatio, CreationKind, UserId};
use serde_json::json;
use tracing::instrument;

use super::media::MediaFolder;
use crate::db::{BrandKitRepository, CompetitorAdRepository, CreationRepository, RepositoryError, UserRepository};
use crate::error::AppError;
use crate::models::{
    AdBurstResult, BrandKit, CompetitorAd, Generation, GenerationResult, NewCreation, User,
};
use crate::render::{DesignBrief, FailureKind, RenderOutcome};
use crate::state::AppState;

/// Brand kit and inspiration ads shared by every variation of a request.
struct Context {
    brand_kit: Option<BrandKit>,
    inspiration: Vec<CompetitorAd>,
}

/// Render and store one design.
///
/// # Errors
///
/// Returns `AppError::PaymentRequired` if the balance does not cover a
/// generation, `AppError::NotFound` for an unknown brand kit, and render,
/// storage or database errors otherwise.
#[instrument(skip(state, generation), fields(aspect_ratio = %generation.aspect_ratio))]
pub async fn generate(
    state: &AppState,
    user_id: UserId,
    generation: &Generation,
    kind: CreationKind,
) -> Result<GenerationResult, AppError> {
    let user = load_user(state, user_id).await?;
    let cost = state.config().credits.generation_cost;
    if !user.can_afford(cost) {
        return Err(insufficient(cost, user.credits));
    }

    let context = resolve_context(state, &user, generation).await?;
    render_one(state, &user, &context, generation, kind, user.credits).await
}

/// Render up to four variations, stopping once the balance runs out.
///
/// # Errors
///
/// Returns `AppError::Forbidden` if the tier does not allow this many
/// variations, `AppError::PaymentRequired` if not even one is affordable,
/// and render, storage or database errors otherwise.
#[instrument(skip(state, generations), fields(requested = generations.len()))]
pub async fn adburst(
    state: &AppState,
    user_id: UserId,
    generations: &[Generation],
) -> Result<AdBurstResult, AppError> {
    let user = load_user(state, user_id).await?;
    let allowed = user.tier.max_variations();
    if generations.len() > allowed {
        return Err(AppError::Forbidden(format!(
            "The {} plan allows at most {allowed} variations per burst",
            user.tier
        )));
    }

    let cost = state.config().credits.generation_cost;
    if !user.can_afford(cost) {
        return Err(insufficient(cost, user.credits));
    }

    let Some(first) = generations.first() else {
        return Err(AppError::BadRequest("no variations requested".to_string()));
    };
    let context = resolve_context(state, &user, first).await?;

    let mut balance = user.credits;
    let mut variations = Vec::with_capacity(generations.len());
    let mut stopped_early = false;

    for generation in generations {
        if next_step(balance, cost) == BurstStep::OutOfCredits {
            stopped_early = true;
            break;
        }
        let result = match render_one(state, &user, &context, generation, CreationKind::Ad, balance).await {
            Ok(result) => result,
            Err(AppError::Database(RepositoryError::InsufficientCredits)) => {
                stopped_early = true;
                break;
            }
            Err(e) => return Err(e),
        };
        balance = result.credits_remaining;
        variations.push(result);
    }

    if stopped_early {
        tracing::info!(rendered = variations.len(), "Burst stopped early: out of credits");
    }

    Ok(AdBurstResult {
        requested: generations.len(),
        variations,
        stopped_early,
        credits_remaining: balance,
    })
}

/// Whether a burst goes on to its next variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstStep {
    Render,
    OutOfCredits,
}

/// Decide the next burst step from the balance left after the previous
/// variations. Fallbacks are free, so only successful renders move `balance`.
#[must_use]
pub const fn next_step(balance: i32, cost: i32) -> BurstStep {
    if balance >= cost {
        BurstStep::Render
    } else {
        BurstStep::OutOfCredits
    }
}

/// Result for an error card: nothing persisted, balance untouched.
fn fallback_result(
    image_url: String,
    aspect_ratio: AspectRatio,
    failure: FailureKind,
    balance: i32,
) -> GenerationResult {
    GenerationResult {
        fallback: true,
        image_url,
        aspect_ratio,
        creation: None,
        message: Some(failure.message().to_string()),
        failure: Some(failure.as_str()),
        credits_remaining: balance,
    }
}

async fn load_user(state: &AppState, user_id: UserId) -> Result<User, AppError> {
    UserRepository::new(state.pool())
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Session user no longer exists".to_string()))
}

fn insufficient(cost: i32, available: i32) -> AppError {
    AppError::PaymentRequired(format!(
        "Insufficient credits: a generation costs {cost}, you have {available}"
    ))
}

async fn resolve_context(
    state: &AppState,
    user: &User,
    generation: &Generation,
) -> Result<Context, AppError> {
    let kits = BrandKitRepository::new(state.pool());
    let brand_kit = match generation.brand_kit_id {
        Some(id) => Some(
            kits.get(user.id, id)
                .await?
                .ok_or_else(|| AppError::NotFound("Brand kit not found".to_string()))?,
        ),
        None => kits.get_active(user.id).await?,
    };

    let inspiration = CompetitorAdRepository::new(state.pool())
        .get_many(user.id, &generation.inspiration_ids)
        .await?;
    if inspiration.len() < generation.inspiration_ids.len() {
        tracing::debug!(
            requested = generation.inspiration_ids.len(),
            found = inspiration.len(),
            "Ignoring inspiration ads not owned by user"
        );
    }

    Ok(Context {
        brand_kit,
        inspiration,
    })
}

async fn render_one(
    state: &AppState,
    user: &User,
    context: &Context,
    generation: &Generation,
    kind: CreationKind,
    balance: i32,
) -> Result<GenerationResult, AppError> {
    let brief = DesignBrief {
        prompt: &generation.prompt,
        aspect_ratio: generation.aspect_ratio,
        template_id: generation.template_id.as_deref(),
        brand_kit: context.brand_kit.as_ref(),
        inspiration: &context.inspiration,
        background_image_url: generation.background_image_url.as_deref(),
        logo_url: generation.logo_url.as_deref(),
    };

    match state.renderer().render(&brief).await? {
        RenderOutcome::Design {
            png,
            headline,
            content,
            html,
            css,
        } => {
            let image = state.media().save_png(MediaFolder::Creations, &png).await?;
            let new = NewCreation {
                user_id: user.id,
                brand_kit_id: context.brand_kit.as_ref().map(|kit| kit.id),
                kind,
                image_url: image.url.clone(),
                headline,
                content,
                style_prompt: generation.prompt.clone(),
                template_id: generation.template_id.clone(),
                aspect_ratio: generation.aspect_ratio,
                metadata: json!({
                    "html": html,
                    "css": css,
                    "inspiration_ids": context.inspiration.iter().map(|ad| ad.id).collect::<Vec<_>>(),
                    "background_image_url": generation.background_image_url,
                    "logo_url": brief.effective_logo_url(),
                }),
            };

            let cost = state.config().credits.generation_cost;
            match CreationRepository::new(state.pool()).create_charged(&new, cost).await {
                Ok((creation, credits_remaining)) => {
                    tracing::info!(creation_id = %creation.id, credits_remaining, "Creation saved");
                    Ok(GenerationResult {
                        fallback: false,
                        image_url: image.url,
                        aspect_ratio: generation.aspect_ratio,
                        creation: Some(creation),
                        message: None,
                        failure: None,
                        credits_remaining,
                    })
                }
                Err(e) => {
                    state.media().discard(&image).await;
                    Err(e.into())
                }
            }
        }
        RenderOutcome::Fallback { png, kind: failure } => {
            let image = state
                .media()
                .save_fallback(failure, generation.aspect_ratio, &png)
                .await?;
            Ok(fallback_result(image.url, generation.aspect_ratio, failure, balance))
        }
    }
}
