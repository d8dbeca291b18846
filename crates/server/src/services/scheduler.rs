//! Background publishing of scheduled social posts.
//!
//! A single task wakes every `scheduler_interval`, loads posts that are
//! `scheduled` with `scheduled_at <= now`, and moves each to `posted` or
//! `failed`. Status transitions are guarded on `status = 'scheduled'`, so a
//! post edited or deleted mid-tick is skipped rather than clobbered.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use super::publisher::{PublishError, WebhookPublisher};
use crate::db::{CreationRepository, RepositoryError, SocialAccountRepository, SocialPostRepository};
use crate::models::{SocialAccount, SocialPost};

/// Posts handled per tick; the rest wait for the next one.
const BATCH_SIZE: i64 = 50;

/// Counts from one scheduler tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub posted: usize,
    pub failed: usize,
}

/// Spawn the scheduler loop. It exits when `shutdown` flips to `true` or its
/// sender is dropped.
pub fn spawn_scheduler(
    pool: PgPool,
    publisher: WebhookPublisher,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "Spawning social post scheduler");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match publish_due(&pool, &publisher).await {
                        Ok(summary) if summary.posted + summary.failed > 0 => {
                            info!(posted = summary.posted, failed = summary.failed, "Scheduler tick complete");
                        }
                        Ok(_) => {}
                        Err(e) => error!(error = %e, "Scheduler tick failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Scheduler stopping");
                        break;
                    }
                }
            }
        }
    })
}

/// Publish every post that is due now.
///
/// Each post is handled on its own: a failure while preparing, publishing or
/// recording one post is logged and counted, and the tick moves on.
///
/// # Errors
///
/// Returns `RepositoryError` only if the due posts cannot be loaded.
#[instrument(skip_all)]
pub async fn publish_due(
    pool: &PgPool,
    publisher: &WebhookPublisher,
) -> Result<TickSummary, RepositoryError> {
    let posts = SocialPostRepository::new(pool);
    let due = posts.due(Utc::now(), BATCH_SIZE).await?;
    let mut summary = TickSummary::default();

    for post in due {
        match publish_one(pool, &posts, publisher, &post).await {
            Ok(Transition::Posted) => summary.posted += 1,
            Ok(Transition::Failed) => summary.failed += 1,
            Ok(Transition::Skipped) => {}
            Err(e) => {
                error!(post_id = %post.id, error = %e, "Failed to record post outcome");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// What happened to one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Posted,
    Failed,
    /// Edited, deleted or handled elsewhere since it was loaded.
    Skipped,
}

async fn publish_one(
    pool: &PgPool,
    posts: &SocialPostRepository<'_>,
    publisher: &WebhookPublisher,
    post: &SocialPost,
) -> Result<Transition, RepositoryError> {
    let outcome = match prepare(pool, post).await? {
        Some((account, image_url)) => publisher.publish(&account, post, image_url.as_deref()).await,
        None => Err(PublishError::AccountMissing),
    };

    let transition = match outcome {
        Ok(()) => {
            // Already published; a lost status write would publish it again next tick.
            let now = Utc::now();
            let marked = match posts.mark_posted(post.id, now).await {
                Ok(marked) => marked,
                Err(e) => {
                    warn!(post_id = %post.id, error = %e, "Retrying posted status");
                    posts.mark_posted(post.id, now).await?
                }
            };
            if marked { Transition::Posted } else { Transition::Skipped }
        }
        Err(e) => {
            warn!(post_id = %post.id, error = %e, "Failed to publish post");
            if posts.mark_failed(post.id, &e.to_string()).await? {
                Transition::Failed
            } else {
                Transition::Skipped
            }
        }
    };
    Ok(transition)
}

/// Load the post's account and, when it links a creation, its image URL.
async fn prepare(
    pool: &PgPool,
    post: &SocialPost,
) -> Result<Option<(SocialAccount, Option<String>)>, RepositoryError> {
    let Some(account) = SocialAccountRepository::new(pool)
        .get_any(post.social_account_id)
        .await?
    else {
        return Ok(None);
    };

    let image_url = match post.creation_id {
        Some(creation_id) => CreationRepository::new(pool)
            .get(post.user_id, creation_id)
            .await?
            .map(|creation| creation.image_url),
        None => None,
    };

    Ok(Some((account, image_url)))
}
