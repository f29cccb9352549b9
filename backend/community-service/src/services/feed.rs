//! Feed Assembler
//!
//! Builds viewer-scoped pages of published posts. Attachments and mentions
//! are loaded once per page for the whole id set, never per post.

use crate::directory::ResolvedHandles;
use crate::domain::models::{
    Attachment, Author, CommentTarget, ContentType, EngagementStats, Poll, Post, PostStatus,
    ViewerReactions,
};
use crate::error::{AuthorizationError, ServiceResult};
use crate::repository::comments::CommentRow;
use crate::repository::feed::FeedRow;
use crate::repository::{
    attachments as attachment_repo, comments as comment_repo, feed as feed_repo,
    posts as post_repo,
};
use crate::services::lifecycle::PostLifecycleService;
use crate::services::mentions::{extract_handles, MentionResolver, RenderedContent};
use chrono::{DateTime, Utc};
use media_storage::MediaStorage;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// One displayable media item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaItem {
    pub attachment_id: Uuid,
    pub url: String,
    pub mime_type: String,
    pub position: i32,
}

/// Media of a post as shown in the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaSet {
    None,
    /// Ordered attachment rows
    Attachments { items: Vec<MediaItem> },
    /// Single media path stored on the post row before attachments existed
    Legacy { url: String },
}

impl MediaSet {
    pub fn len(&self) -> usize {
        match self {
            MediaSet::None => 0,
            MediaSet::Attachments { items } => items.len(),
            MediaSet::Legacy { .. } => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedPost {
    pub id: Uuid,
    pub author: Author,
    pub content_type: ContentType,
    pub status: PostStatus,
    pub body: String,
    pub content: RenderedContent,
    pub poll: Option<Poll>,
    pub media: MediaSet,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub stats: EngagementStats,
    pub viewer: ViewerReactions,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub target: CommentTarget,
    pub author: Author,
    pub body: String,
    pub content: RenderedContent,
    pub created_at: DateTime<Utc>,
}

/// Clamp paging input: offset >= 0, limit within 1..=max_limit
pub fn clamp_page(offset: i64, limit: i64, max_limit: i64) -> (i64, i64) {
    (offset.max(0), limit.clamp(1, max_limit.max(1)))
}

pub struct FeedAssembler {
    pool: PgPool,
    lifecycle: Arc<PostLifecycleService>,
    mentions: Arc<MentionResolver>,
    storage: Arc<dyn MediaStorage>,
    max_limit: i64,
}

impl FeedAssembler {
    pub fn new(
        pool: PgPool,
        lifecycle: Arc<PostLifecycleService>,
        mentions: Arc<MentionResolver>,
        storage: Arc<dyn MediaStorage>,
        max_limit: i64,
    ) -> Self {
        Self {
            pool,
            lifecycle,
            mentions,
            storage,
            max_limit,
        }
    }

    /// One page of the published feed, newest first
    pub async fn get_feed_page(
        &self,
        viewer_id: Option<Uuid>,
        offset: i64,
        limit: i64,
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<FeedPost>> {
        self.lifecycle.sweep_due_posts(now).await?;

        let (offset, limit) = clamp_page(offset, limit, self.max_limit);
        let rows = feed_repo::fetch_page(&self.pool, viewer_id, offset, limit).await?;

        tracing::debug!(
            viewer = ?viewer_id,
            offset,
            limit,
            posts = rows.len(),
            "Assembling feed page"
        );

        self.assemble(rows).await
    }

    /// A single published post, assembled like a feed entry
    pub async fn get_post(
        &self,
        viewer_id: Option<Uuid>,
        post_id: Uuid,
        now: DateTime<Utc>,
    ) -> ServiceResult<FeedPost> {
        self.lifecycle.sweep_due_posts(now).await?;

        let row = feed_repo::fetch_one(&self.pool, viewer_id, post_id)
            .await?
            .ok_or(AuthorizationError::PostNotFound)?;

        self.assemble(vec![row])
            .await?
            .pop()
            .ok_or(AuthorizationError::PostNotFound.into())
    }

    /// Comments of a post or news item, oldest first
    pub async fn list_comments(
        &self,
        target: CommentTarget,
        offset: i64,
        limit: i64,
    ) -> ServiceResult<Vec<CommentView>> {
        match target {
            CommentTarget::CommunityPost(post_id) => {
                if !post_repo::is_published(&self.pool, post_id).await? {
                    return Err(AuthorizationError::PostNotFound.into());
                }
            }
            CommentTarget::NewsItem(news_id) => {
                if !comment_repo::news_item_exists(&self.pool, news_id).await? {
                    return Err(AuthorizationError::NewsItemNotFound.into());
                }
            }
        }

        let (offset, limit) = clamp_page(offset, limit, self.max_limit);
        let rows = comment_repo::list(&self.pool, target, offset, limit).await?;
        let resolved = self
            .resolve_all(rows.iter().map(|r| r.comment.body.as_str()))
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| self.comment_view(target, row, &resolved))
            .collect())
    }

    async fn assemble(&self, rows: Vec<FeedRow>) -> ServiceResult<Vec<FeedPost>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.post.id).collect();

        let mut attachments: HashMap<Uuid, Vec<Attachment>> = HashMap::new();
        for attachment in attachment_repo::list_for_posts(&self.pool, &ids).await? {
            attachments
                .entry(attachment.post_id)
                .or_default()
                .push(attachment);
        }

        let resolved = self
            .resolve_all(rows.iter().map(|r| r.post.body.as_str()))
            .await?;

        let mut page = Vec::with_capacity(rows.len());
        for row in rows {
            let author = row.author();
            let stats = row.stats();
            let viewer = row.viewer();
            let post = post_repo::into_post(row.post)?;
            let media = self.media_set(&post, attachments.remove(&post.id).unwrap_or_default());
            let content = self.mentions.render(&post.body, &resolved);

            page.push(FeedPost {
                id: post.id,
                author,
                content_type: post.content_type,
                status: post.status,
                body: post.body,
                content,
                poll: post.poll,
                media,
                published_at: post.published_at,
                created_at: post.created_at,
                stats,
                viewer,
            });
        }

        Ok(page)
    }

    /// Resolve every handle mentioned across `bodies` in one directory lookup
    async fn resolve_all<'a>(
        &self,
        bodies: impl Iterator<Item = &'a str>,
    ) -> ServiceResult<ResolvedHandles> {
        let mut handles: Vec<String> = Vec::new();
        for body in bodies {
            for handle in extract_handles(body) {
                if !handles.contains(&handle) {
                    handles.push(handle);
                }
            }
        }
        Ok(self.mentions.resolve(&handles).await?)
    }

    fn media_set(&self, post: &Post, attachments: Vec<Attachment>) -> MediaSet {
        if !attachments.is_empty() {
            let items = attachments
                .into_iter()
                .map(|a| MediaItem {
                    attachment_id: a.id,
                    url: self.storage.public_url(&a.storage_key),
                    mime_type: a.mime_type,
                    position: a.position,
                })
                .collect();
            return MediaSet::Attachments { items };
        }

        match post.legacy_media_url.as_deref() {
            Some(url) => MediaSet::Legacy {
                url: legacy_url(url, |key| self.storage.public_url(key)),
            },
            None => MediaSet::None,
        }
    }

    fn comment_view(
        &self,
        target: CommentTarget,
        row: CommentRow,
        resolved: &ResolvedHandles,
    ) -> CommentView {
        let content = self.mentions.render(&row.comment.body, resolved);
        CommentView {
            id: row.comment.id,
            target,
            author: Author {
                id: row.comment.user_id,
                username: row.username,
                badge: row.badge,
            },
            body: row.comment.body,
            content,
            created_at: row.comment.created_at,
        }
    }
}

/// Absolute and root-relative legacy paths are served as is; anything else
/// is a storage key
fn legacy_url(raw: &str, public_url: impl Fn(&str) -> String) -> String {
    let raw = raw.trim();
    if raw.starts_with("http://") || raw.starts_with("https://") || raw.starts_with('/') {
        raw.to_string()
    } else {
        public_url(raw)
    }
}
