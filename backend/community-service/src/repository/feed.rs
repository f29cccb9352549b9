use crate::domain::models::{Author, EngagementStats, PostRow, ViewerReactions};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Published post with author card, aggregate counters and the viewer's
/// own reaction state
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedRow {
    #[sqlx(flatten)]
    pub post: PostRow,
    pub author_username: String,
    pub author_badge: Option<String>,
    pub likes_count: i64,
    pub supports_count: i64,
    pub comments_count: i64,
    pub viewer_liked: bool,
    pub viewer_supported: bool,
}

impl FeedRow {
    pub fn author(&self) -> Author {
        Author {
            id: self.post.user_id,
            username: self.author_username.clone(),
            badge: self.author_badge.clone(),
        }
    }

    pub fn stats(&self) -> EngagementStats {
        EngagementStats {
            likes_count: self.likes_count,
            supports_count: self.supports_count,
            comments_count: self.comments_count,
        }
    }

    pub fn viewer(&self) -> ViewerReactions {
        ViewerReactions {
            liked: self.viewer_liked,
            supported: self.viewer_supported,
        }
    }
}

// $1 is the optional viewer id; a NULL viewer never matches a reaction row.
const FEED_SELECT: &str = r#"
    SELECT p.id, p.user_id, p.body, p.content_type, p.poll_question, p.poll_options,
           p.status, p.scheduled_for, p.published_at, p.media_url,
           p.cover_attachment_id, p.created_at, p.updated_at,
           u.username AS author_username,
           u.badge AS author_badge,
           (SELECT COUNT(*) FROM community_post_reactions r
             WHERE r.post_id = p.id AND r.reaction_type = 'like') AS likes_count,
           (SELECT COUNT(*) FROM community_post_reactions r
             WHERE r.post_id = p.id AND r.reaction_type = 'support') AS supports_count,
           (SELECT COUNT(*) FROM community_post_comments c
             WHERE c.post_id = p.id) AS comments_count,
           EXISTS(SELECT 1 FROM community_post_reactions r
             WHERE r.post_id = p.id AND r.user_id = $1
               AND r.reaction_type = 'like') AS viewer_liked,
           EXISTS(SELECT 1 FROM community_post_reactions r
             WHERE r.post_id = p.id AND r.user_id = $1
               AND r.reaction_type = 'support') AS viewer_supported
    FROM community_posts p
    JOIN users u ON u.id = p.user_id
    WHERE p.status = 'published'
"#;

/// One page of published posts, newest publication first
pub async fn fetch_page<'e, E>(
    executor: E,
    viewer_id: Option<Uuid>,
    offset: i64,
    limit: i64,
) -> Result<Vec<FeedRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "{FEED_SELECT} ORDER BY p.published_at DESC, p.created_at DESC, p.id DESC OFFSET $2 LIMIT $3"
    );

    sqlx::query_as::<_, FeedRow>(&sql)
        .bind(viewer_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(executor)
        .await
}

pub async fn fetch_one<'e, E>(
    executor: E,
    viewer_id: Option<Uuid>,
    post_id: Uuid,
) -> Result<Option<FeedRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = format!("{FEED_SELECT} AND p.id = $2");

    sqlx::query_as::<_, FeedRow>(&sql)
        .bind(viewer_id)
        .bind(post_id)
        .fetch_optional(executor)
        .await
}
