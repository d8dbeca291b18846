//! Social account and scheduled post handlers.

use adburst_core::{CreationId, PostStatus, SocialAccountId, SocialPostId};
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::db::{CreationRepository, SocialAccountRepository, SocialPostRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{
    CurrentUser, SocialAccount, SocialAccountInput, SocialPost, SocialPostInput, SocialPostUpdate,
};
use crate::state::AppState;

fn account_not_found() -> AppError {
    AppError::NotFound("Social account not found".to_string())
}

fn post_not_found() -> AppError {
    AppError::NotFound("Social post not found".to_string())
}

// =============================================================================
// Accounts
// =============================================================================

/// GET /api/social-accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<SocialAccount>>> {
    let accounts = SocialAccountRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(accounts))
}

/// POST /api/social-accounts
#[instrument(skip(state, input), fields(user_id = %user.id))]
pub async fn create_account(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<SocialAccountInput>,
) -> Result<(StatusCode, Json<SocialAccount>)> {
    let input = input.validate()?;
    let account = SocialAccountRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    tracing::info!(account_id = %account.id, platform = %account.platform, "Social account connected");
    Ok((StatusCode::CREATED, Json(account)))
}

/// PUT /api/social-accounts/{id}
#[instrument(skip(state, input), fields(user_id = %user.id))]
pub async fn update_account(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<SocialAccountId>,
    ApiJson(input): ApiJson<SocialAccountInput>,
) -> Result<Json<SocialAccount>> {
    let input = input.validate()?;
    SocialAccountRepository::new(state.pool())
        .update(user.id, id, &input)
        .await?
        .map(Json)
        .ok_or_else(account_not_found)
}

/// DELETE /api/social-accounts/{id}
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn delete_account(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<SocialAccountId>,
) -> Result<StatusCode> {
    if SocialAccountRepository::new(state.pool()).delete(user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(account_not_found())
    }
}

// =============================================================================
// Posts
// =============================================================================

/// Query parameters for `GET /api/social-posts`.
#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub status: Option<String>,
}

impl PostListQuery {
    fn status(&self) -> Result<Option<PostStatus>> {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .transpose()
            .map_err(|e: adburst_core::InvalidVariant| AppError::BadRequest(e.to_string()))
    }
}

/// GET /api/social-posts
pub async fn list_posts(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiQuery(query): ApiQuery<PostListQuery>,
) -> Result<Json<Vec<SocialPost>>> {
    let status = query.status()?;
    let posts = SocialPostRepository::new(state.pool())
        .list(user.id, status)
        .await?;
    Ok(Json(posts))
}

/// Reject posts targeting an account the user does not own.
async fn ensure_account(state: &AppState, user: &CurrentUser, id: SocialAccountId) -> Result<()> {
    SocialAccountRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .map(|_| ())
        .ok_or_else(account_not_found)
}

/// Reject posts linking a creation the user does not own.
async fn ensure_creation(state: &AppState, user: &CurrentUser, id: Option<CreationId>) -> Result<()> {
    let Some(id) = id else {
        return Ok(());
    };
    CreationRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Creation not found".to_string()))
}

/// The creation an edit newly links, if it links a different one.
fn newly_linked(current: Option<CreationId>, merged: Option<CreationId>) -> Option<CreationId> {
    merged.filter(|id| current != Some(*id))
}

/// POST /api/social-posts
#[instrument(skip(state, input), fields(user_id = %user.id))]
pub async fn create_post(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<SocialPostInput>,
) -> Result<(StatusCode, Json<SocialPost>)> {
    let post = input.validate()?;
    ensure_account(&state, &user, post.social_account_id).await?;
    ensure_creation(&state, &user, post.creation_id).await?;

    let post = SocialPostRepository::new(state.pool())
        .create(user.id, &post)
        .await?;
    tracing::info!(post_id = %post.id, scheduled_at = %post.scheduled_at, "Post scheduled");
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/social-posts/{id}
///
/// Only posts still waiting to publish can be edited.
#[instrument(skip(state, update), fields(user_id = %user.id))]
pub async fn update_post(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<SocialPostId>,
    ApiJson(update): ApiJson<SocialPostUpdate>,
) -> Result<Json<SocialPost>> {
    let posts = SocialPostRepository::new(state.pool());
    let current = posts.get(user.id, id).await?.ok_or_else(post_not_found)?;
    if !current.status.is_editable() {
        return Err(AppError::Conflict(format!(
            "Post is already {} and can no longer be edited",
            current.status
        )));
    }

    let merged = update.apply(&current)?;
    if merged.social_account_id != current.social_account_id {
        ensure_account(&state, &user, merged.social_account_id).await?;
    }
    ensure_creation(&state, &user, newly_linked(current.creation_id, merged.creation_id)).await?;

    // The status may have changed since the read; the update only matches scheduled rows.
    posts
        .update_scheduled(user.id, id, &merged)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::Conflict("Post is no longer scheduled".to_string()))
}

/// DELETE /api/social-posts/{id}
#[instrument(skip(state), fields(user_id = %user.id))]
pub async fn delete_post(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<SocialPostId>,
) -> Result<StatusCode> {
    if SocialPostRepository::new(state.pool()).delete(user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(post_not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter() {
        let query = PostListQuery {
            status: Some("failed".to_string()),
        };
        assert_eq!(query.status().ok().flatten(), Some(PostStatus::Failed));
        assert_eq!(PostListQuery::default().status().ok().flatten(), None);

        let query = PostListQuery {
            status: Some("queued".to_string()),
        };
        assert!(matches!(query.status(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_edit_checks_only_newly_linked_creation() {
        let a = Some(CreationId::new(7));
        let b = Some(CreationId::new(8));
        assert_eq!(newly_linked(None, a), a);
        assert_eq!(newly_linked(a, b), b);
        assert_eq!(newly_linked(a, a), None);
        assert_eq!(newly_linked(a, None), None);
        assert_eq!(newly_linked(None, None), None);
    }
}
