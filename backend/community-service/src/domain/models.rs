use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum post body length (characters)
pub const MAX_BODY_CHARS: usize = 500;
/// Maximum poll question length (characters)
pub const MAX_POLL_QUESTION_CHARS: usize = 250;
/// Maximum poll option length (characters); longer options are truncated
pub const MAX_POLL_OPTION_CHARS: usize = 120;
pub const MIN_POLL_OPTIONS: usize = 2;
pub const MAX_POLL_OPTIONS: usize = 4;
/// Comment length on community posts
pub const MAX_POST_COMMENT_CHARS: usize = 600;
/// Comment length on news items
pub const MAX_NEWS_COMMENT_CHARS: usize = 800;

/// Persisted content shape of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Photo,
    Gallery,
    Poll,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Photo => "photo",
            ContentType::Gallery => "gallery",
            ContentType::Poll => "poll",
        }
    }

    /// Photo and gallery are the only shapes that carry attachments
    pub fn carries_attachments(&self) -> bool {
        matches!(self, ContentType::Photo | ContentType::Gallery)
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ContentType::Text),
            "photo" => Ok(ContentType::Photo),
            "gallery" => Ok(ContentType::Gallery),
            "poll" => Ok(ContentType::Poll),
            other => Err(format!("unknown content type '{}'", other)),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
        }
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "scheduled" => Ok(PostStatus::Scheduled),
            "published" => Ok(PostStatus::Published),
            other => Err(format!("unknown post status '{}'", other)),
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
    Like,
    Support,
}

impl ReactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionType::Like => "like",
            ReactionType::Support => "support",
        }
    }
}

impl FromStr for ReactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" => Ok(ReactionType::Like),
            "support" => Ok(ReactionType::Support),
            other => Err(format!("unknown reaction type '{}'", other)),
        }
    }
}

/// Result of a reaction toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleOutcome {
    Added,
    Removed,
}

impl ToggleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleOutcome::Added => "added",
            ToggleOutcome::Removed => "removed",
        }
    }
}

/// Raw `community_posts` row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub content_type: String,
    pub poll_question: Option<String>,
    pub poll_options: Vec<String>,
    pub status: String,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub media_url: Option<String>,
    pub cover_attachment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub question: String,
    pub options: Vec<String>,
}

/// Community post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub content_type: ContentType,
    pub poll: Option<Poll>,
    pub status: PostStatus,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    /// Pre-attachment-table single media path, read-only
    pub legacy_media_url: Option<String>,
    pub cover_attachment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = String;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let content_type: ContentType = row.content_type.parse()?;
        let status: PostStatus = row.status.parse()?;
        let poll = match content_type {
            ContentType::Poll => Some(Poll {
                question: row.poll_question.unwrap_or_default(),
                options: row.poll_options,
            }),
            _ => None,
        };

        Ok(Post {
            id: row.id,
            author_id: row.user_id,
            body: row.body,
            content_type,
            poll,
            status,
            scheduled_for: row.scheduled_for,
            published_at: row.published_at,
            legacy_media_url: row.media_url.filter(|url| !url.trim().is_empty()),
            cover_attachment_id: row.cover_attachment_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Ordered media item owned by a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub storage_key: String,
    pub mime_type: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// Comment on a community post or a news item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub target_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// What a comment is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CommentTarget {
    CommunityPost(Uuid),
    NewsItem(Uuid),
}

impl CommentTarget {
    pub fn id(&self) -> Uuid {
        match self {
            CommentTarget::CommunityPost(id) | CommentTarget::NewsItem(id) => *id,
        }
    }

    pub fn max_chars(&self) -> usize {
        match self {
            CommentTarget::CommunityPost(_) => MAX_POST_COMMENT_CHARS,
            CommentTarget::NewsItem(_) => MAX_NEWS_COMMENT_CHARS,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CommentTarget::CommunityPost(_) => "community_post",
            CommentTarget::NewsItem(_) => "news_item",
        }
    }
}

/// Public author card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
    pub badge: Option<String>,
}

/// Derived engagement counters, always aggregated at read time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementStats {
    pub likes_count: i64,
    pub supports_count: i64,
    pub comments_count: i64,
}

/// Reactions the current viewer has on a post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerReactions {
    pub liked: bool,
    pub supported: bool,
}
