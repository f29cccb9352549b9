//! Engagement Ledger
//!
//! Reactions are existence rows toggled on and off; comments are append
//! only. Counters are never stored, the feed aggregates them at read time.

use crate::domain::models::{Comment, CommentTarget, ReactionType, ToggleOutcome};
use crate::error::{AuthorizationError, Rejection, ServiceResult};
use crate::metrics;
use crate::repository::{comments as comment_repo, posts as post_repo, reactions as reaction_repo};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct EngagementLedger {
    pool: PgPool,
}

impl EngagementLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Flip the (post, user, type) reaction.
    ///
    /// Only published posts accept reactions. Two racing "add" calls both
    /// report `Added`; the primary key keeps a single row.
    pub async fn toggle_reaction(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        reaction: ReactionType,
        now: DateTime<Utc>,
    ) -> ServiceResult<ToggleOutcome> {
        if !post_repo::is_published(&self.pool, post_id).await? {
            return Err(AuthorizationError::PostNotFound.into());
        }

        let mut tx = self.pool.begin().await?;

        let outcome = if reaction_repo::exists(&mut *tx, post_id, user_id, reaction).await? {
            reaction_repo::delete(&mut *tx, post_id, user_id, reaction).await?;
            ToggleOutcome::Removed
        } else {
            let inserted = reaction_repo::insert(&mut *tx, post_id, user_id, reaction, now).await?;
            if !inserted {
                tracing::debug!(
                    post_id = %post_id,
                    user_id = %user_id,
                    reaction = reaction.as_str(),
                    "Concurrent reaction insert, treating as added"
                );
            }
            ToggleOutcome::Added
        };

        tx.commit().await?;

        metrics::record_reaction_toggled(reaction.as_str(), outcome.as_str());
        tracing::debug!(
            post_id = %post_id,
            user_id = %user_id,
            reaction = reaction.as_str(),
            outcome = outcome.as_str(),
            "Reaction toggled"
        );

        Ok(outcome)
    }

    /// Append a comment to a published community post or a news item
    pub async fn add_comment(
        &self,
        target: CommentTarget,
        user_id: Uuid,
        body: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<Comment> {
        let body = normalize_comment(body, target.max_chars())?;

        let exists = match target {
            CommentTarget::CommunityPost(post_id) => {
                post_repo::is_published(&self.pool, post_id).await?
            }
            CommentTarget::NewsItem(news_id) => {
                comment_repo::news_item_exists(&self.pool, news_id).await?
            }
        };
        if !exists {
            return Err(match target {
                CommentTarget::CommunityPost(_) => AuthorizationError::PostNotFound,
                CommentTarget::NewsItem(_) => AuthorizationError::NewsItemNotFound,
            }
            .into());
        }

        let comment = comment_repo::insert(&self.pool, target, user_id, &body, now).await?;

        metrics::record_comment_added(target.label());
        tracing::debug!(
            comment_id = %comment.id,
            target = target.label(),
            target_id = %target.id(),
            "Comment added"
        );

        Ok(comment)
    }
}

/// Trim and length-check a comment body
pub fn normalize_comment(body: &str, max_chars: usize) -> Result<String, Rejection> {
    let body = body.trim();
    if body.is_empty() {
        return Err(Rejection::EmptyComment);
    }
    if body.chars().count() > max_chars {
        return Err(Rejection::CommentTooLong { max: max_chars });
    }
    Ok(body.to_string())
}
