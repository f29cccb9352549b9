use crate::domain::models::{Comment, CommentTarget};
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Comment joined with its author card
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    #[sqlx(flatten)]
    pub comment: Comment,
    pub username: String,
    pub badge: Option<String>,
}

pub async fn insert<'e, E>(
    executor: E,
    target: CommentTarget,
    user_id: Uuid,
    body: &str,
    now: DateTime<Utc>,
) -> Result<Comment, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = match target {
        CommentTarget::CommunityPost(_) => {
            r#"
            INSERT INTO community_post_comments (id, post_id, user_id, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, post_id AS target_id, user_id, body, created_at
            "#
        }
        CommentTarget::NewsItem(_) => {
            r#"
            INSERT INTO news_comments (id, news_id, user_id, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, news_id AS target_id, user_id, body, created_at
            "#
        }
    };

    sqlx::query_as::<_, Comment>(sql)
        .bind(Uuid::new_v4())
        .bind(target.id())
        .bind(user_id)
        .bind(body)
        .bind(now)
        .fetch_one(executor)
        .await
}

/// Comments of one target, oldest first
pub async fn list<'e, E>(
    executor: E,
    target: CommentTarget,
    offset: i64,
    limit: i64,
) -> Result<Vec<CommentRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = match target {
        CommentTarget::CommunityPost(_) => {
            r#"
            SELECT c.id, c.post_id AS target_id, c.user_id, c.body, c.created_at,
                   u.username, u.badge
            FROM community_post_comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            OFFSET $2 LIMIT $3
            "#
        }
        CommentTarget::NewsItem(_) => {
            r#"
            SELECT c.id, c.news_id AS target_id, c.user_id, c.body, c.created_at,
                   u.username, u.badge
            FROM news_comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.news_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            OFFSET $2 LIMIT $3
            "#
        }
    };

    sqlx::query_as::<_, CommentRow>(sql)
        .bind(target.id())
        .bind(offset)
        .bind(limit)
        .fetch_all(executor)
        .await
}

pub async fn news_item_exists<'e, E>(executor: E, news_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM news_items WHERE id = $1)")
        .bind(news_id)
        .fetch_one(executor)
        .await
}
