//! Post Lifecycle State Machine
//!
//! Creates and updates posts from validated intents and promotes due
//! scheduled posts. A submission is one transaction: lock, upsert the row,
//! reconcile attachments, recompute the cover, commit. New files are stored
//! before the transaction opens and deleted again if it does not commit.

use crate::domain::intent::{ComposerInput, EditablePost, PostIntent, TargetStatus};
use crate::domain::lifecycle::ensure_editable_by;
use crate::domain::models::{Attachment, ContentType, Post, PostStatus};
use crate::error::{AuthorizationError, ServiceResult};
use crate::metrics;
use crate::repository::{attachments as attachment_repo, posts as post_repo};
use crate::services::attachments::{apply_reconciliation, plan_reconciliation, purge_files};
use crate::services::composer::ComposerValidator;
use chrono::{DateTime, Utc};
use media_storage::{MediaStorage, StoredObject, Upload, UploadPolicy};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Result of a successful submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub post: Post,
    pub attachments: Vec<Attachment>,
}

impl SubmitOutcome {
    pub fn post_id(&self) -> Uuid {
        self.post.id
    }

    pub fn status(&self) -> PostStatus {
        self.post.status
    }
}

/// Transaction output before files are purged
struct Written {
    outcome: SubmitOutcome,
    removed_keys: Vec<String>,
}

pub struct PostLifecycleService {
    pool: PgPool,
    storage: Arc<dyn MediaStorage>,
    validator: ComposerValidator,
    upload_policy: UploadPolicy,
}

impl PostLifecycleService {
    pub fn new(pool: PgPool, storage: Arc<dyn MediaStorage>, validator: ComposerValidator) -> Self {
        let upload_policy = UploadPolicy::composer(validator.config().max_upload_bytes);
        Self {
            pool,
            storage,
            validator,
            upload_policy,
        }
    }

    /// Validate a raw composer submission and persist it
    pub async fn compose(
        &self,
        author_id: Uuid,
        input: ComposerInput,
        now: DateTime<Utc>,
    ) -> ServiceResult<SubmitOutcome> {
        let existing = match input.post_id {
            Some(post_id) => self.find_editable(post_id).await?,
            None => None,
        };

        let intent = self
            .validator
            .validate(author_id, input, existing.as_ref(), now)?;

        self.submit_intent(intent, now).await
    }

    /// Persist a validated intent
    pub async fn submit_intent(
        &self,
        intent: PostIntent,
        now: DateTime<Utc>,
    ) -> ServiceResult<SubmitOutcome> {
        let PostIntent {
            post_id,
            author_id,
            content,
            target,
        } = intent;

        let body = content.body().to_string();
        let requested_type = content.content_type();
        let (poll_question, poll_options) = match content.poll() {
            Some((question, options)) => (Some(question.to_string()), options.to_vec()),
            None => (None, Vec::new()),
        };
        let plan = content.into_attachment_plan();

        let stored = self.store_uploads(&plan.uploads, now).await?;
        let stored_keys: Vec<String> = stored.iter().map(|s| s.key.clone()).collect();

        let draft = DraftWrite {
            post_id,
            author_id,
            body: &body,
            requested_type,
            poll_question: poll_question.as_deref(),
            poll_options: &poll_options,
            target,
            keep: &plan.keep,
        };

        let written = match self.write_in_transaction(&draft, &stored, now).await {
            Ok(written) => written,
            Err(e) => {
                if !stored_keys.is_empty() {
                    tracing::warn!(
                        files = stored_keys.len(),
                        error = %e,
                        "Submission failed, removing uploaded files"
                    );
                    purge_files(self.storage.as_ref(), &stored_keys).await;
                }
                return Err(e);
            }
        };

        if !written.removed_keys.is_empty() {
            purge_files(self.storage.as_ref(), &written.removed_keys).await;
        }

        let outcome = written.outcome;
        metrics::record_post_submitted(
            outcome.post.status.as_str(),
            outcome.post.content_type.as_str(),
        );
        tracing::info!(
            post_id = %outcome.post.id,
            author_id = %outcome.post.author_id,
            status = %outcome.post.status,
            content_type = %outcome.post.content_type,
            attachments = outcome.attachments.len(),
            "Post submitted"
        );

        Ok(outcome)
    }

    async fn store_uploads(
        &self,
        uploads: &[Upload],
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<StoredObject>> {
        let mut stored = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.storage.save_upload(upload, &self.upload_policy, now).await {
                Ok(object) => stored.push(object),
                Err(e) => {
                    let keys: Vec<String> = stored.iter().map(|s| s.key.clone()).collect();
                    purge_files(self.storage.as_ref(), &keys).await;
                    return Err(e.into());
                }
            }
        }
        Ok(stored)
    }

    async fn write_in_transaction(
        &self,
        draft: &DraftWrite<'_>,
        stored: &[StoredObject],
        now: DateTime<Utc>,
    ) -> ServiceResult<Written> {
        let mut tx = self.pool.begin().await?;
        let written = self.write_post(&mut tx, draft, stored, now).await?;
        tx.commit().await?;
        Ok(written)
    }

    async fn write_post(
        &self,
        conn: &mut PgConnection,
        draft: &DraftWrite<'_>,
        stored: &[StoredObject],
        now: DateTime<Utc>,
    ) -> ServiceResult<Written> {
        // Re-check ownership under the row lock; the composer check ran
        // against an unlocked read.
        let current = match draft.post_id {
            Some(post_id) => {
                let post = post_repo::find_post_for_update(&mut *conn, post_id)
                    .await?
                    .ok_or(AuthorizationError::PostNotFound)?;
                ensure_editable_by(&post, draft.author_id)?;
                attachment_repo::list_for_post(&mut *conn, post_id).await?
            }
            None => Vec::new(),
        };

        let max = self.validator.config().max_attachments();
        let plan = plan_reconciliation(&current, draft.keep, stored.len(), max)?;

        let content_type = match draft.requested_type {
            t if t.carries_attachments() => {
                if plan.final_len(stored.len()) > 1 {
                    ContentType::Gallery
                } else {
                    ContentType::Photo
                }
            }
            other => other,
        };

        let status = draft.target.status();
        let write = post_repo::PostWrite {
            body: draft.body,
            content_type,
            poll_question: draft.poll_question,
            poll_options: draft.poll_options,
            status,
            scheduled_for: draft.target.scheduled_for(),
            published_at: (status == PostStatus::Published).then_some(now),
        };

        let mut post = match draft.post_id {
            Some(post_id) => post_repo::update_post(&mut *conn, post_id, &write, now).await?,
            None => post_repo::insert_post(&mut *conn, draft.author_id, &write, now).await?,
        };

        let attachments = apply_reconciliation(&mut *conn, post.id, &plan, stored, now).await?;

        let cover = attachments.first().map(|a| a.id);
        if post.cover_attachment_id != cover {
            post_repo::set_cover(&mut *conn, post.id, cover).await?;
            post.cover_attachment_id = cover;
        }

        Ok(Written {
            outcome: SubmitOutcome { post, attachments },
            removed_keys: plan.delete.into_iter().map(|a| a.storage_key).collect(),
        })
    }

    /// Promote every scheduled post due at `now`
    pub async fn sweep_due_posts(&self, now: DateTime<Utc>) -> ServiceResult<Vec<Uuid>> {
        let promoted = post_repo::promote_due_posts(&self.pool, now).await?;

        if !promoted.is_empty() {
            metrics::record_posts_promoted(promoted.len() as u64);
            tracing::info!(promoted = promoted.len(), "Promoted scheduled posts");
        }

        Ok(promoted)
    }

    async fn find_editable(&self, post_id: Uuid) -> ServiceResult<Option<EditablePost>> {
        let Some(post) = post_repo::find_post(&self.pool, post_id).await? else {
            return Ok(None);
        };
        let attachments = attachment_repo::list_for_post(&self.pool, post_id).await?;
        Ok(Some(EditablePost { post, attachments }))
    }

    /// Reopen a draft or scheduled post in the composer
    pub async fn load_editable(
        &self,
        post_id: Uuid,
        author_id: Uuid,
    ) -> ServiceResult<EditablePost> {
        let editable = self
            .find_editable(post_id)
            .await?
            .ok_or(AuthorizationError::PostNotFound)?;
        ensure_editable_by(&editable.post, author_id)?;
        Ok(editable)
    }

    /// Drafts and scheduled posts of an author, most recently edited first
    pub async fn list_author_queue(&self, author_id: Uuid) -> ServiceResult<Vec<EditablePost>> {
        let posts = post_repo::list_author_queue(&self.pool, author_id).await?;
        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();

        let mut by_post: HashMap<Uuid, Vec<Attachment>> = HashMap::new();
        for attachment in attachment_repo::list_for_posts(&self.pool, &ids).await? {
            by_post.entry(attachment.post_id).or_default().push(attachment);
        }

        Ok(posts
            .into_iter()
            .map(|post| EditablePost {
                attachments: by_post.remove(&post.id).unwrap_or_default(),
                post,
            })
            .collect())
    }
}

/// Borrowed column values for one submission
struct DraftWrite<'a> {
    post_id: Option<Uuid>,
    author_id: Uuid,
    body: &'a str,
    requested_type: ContentType,
    poll_question: Option<&'a str>,
    poll_options: &'a [String],
    target: TargetStatus,
    keep: &'a [Uuid],
}
