use crate::domain::models::{ContentType, Post, PostRow, PostStatus};
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

pub(crate) const POST_COLUMNS: &str = "id, user_id, body, content_type, poll_question, \
     poll_options, status, scheduled_for, published_at, media_url, cover_attachment_id, \
     created_at, updated_at";

/// Column values written by the composer
#[derive(Debug, Clone)]
pub struct PostWrite<'a> {
    pub body: &'a str,
    pub content_type: ContentType,
    pub poll_question: Option<&'a str>,
    pub poll_options: &'a [String],
    pub status: PostStatus,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

pub(crate) fn into_post(row: PostRow) -> Result<Post, sqlx::Error> {
    Post::try_from(row).map_err(|e| sqlx::Error::Decode(e.into()))
}

pub async fn find_post<'e, E>(executor: E, post_id: Uuid) -> Result<Option<Post>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM community_posts WHERE id = $1"
    ))
    .bind(post_id)
    .fetch_optional(executor)
    .await?;

    row.map(into_post).transpose()
}

/// Load a post and lock its row until the transaction ends
pub async fn find_post_for_update<'e, E>(
    executor: E,
    post_id: Uuid,
) -> Result<Option<Post>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM community_posts WHERE id = $1 FOR UPDATE"
    ))
    .bind(post_id)
    .fetch_optional(executor)
    .await?;

    row.map(into_post).transpose()
}

pub async fn insert_post<'e, E>(
    executor: E,
    author_id: Uuid,
    write: &PostWrite<'_>,
    now: DateTime<Utc>,
) -> Result<Post, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, PostRow>(&format!(
        r#"
        INSERT INTO community_posts
            (id, user_id, body, content_type, poll_question, poll_options,
             status, scheduled_for, published_at, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(author_id)
    .bind(write.body)
    .bind(write.content_type.as_str())
    .bind(write.poll_question)
    .bind(write.poll_options)
    .bind(write.status.as_str())
    .bind(write.scheduled_for)
    .bind(write.published_at)
    .bind(now)
    .fetch_one(executor)
    .await?;

    into_post(row)
}

pub async fn update_post<'e, E>(
    executor: E,
    post_id: Uuid,
    write: &PostWrite<'_>,
    now: DateTime<Utc>,
) -> Result<Post, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, PostRow>(&format!(
        r#"
        UPDATE community_posts
        SET body = $2,
            content_type = $3,
            poll_question = $4,
            poll_options = $5,
            status = $6,
            scheduled_for = $7,
            published_at = $8,
            updated_at = $9
        WHERE id = $1
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(post_id)
    .bind(write.body)
    .bind(write.content_type.as_str())
    .bind(write.poll_question)
    .bind(write.poll_options)
    .bind(write.status.as_str())
    .bind(write.scheduled_for)
    .bind(write.published_at)
    .bind(now)
    .fetch_one(executor)
    .await?;

    into_post(row)
}

pub async fn set_cover<'e, E>(
    executor: E,
    post_id: Uuid,
    cover_attachment_id: Option<Uuid>,
) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE community_posts SET cover_attachment_id = $2 WHERE id = $1")
        .bind(post_id)
        .bind(cover_attachment_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Promote every scheduled post whose time has come, in one statement
pub async fn promote_due_posts<'e, E>(
    executor: E,
    now: DateTime<Utc>,
) -> Result<Vec<Uuid>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, Uuid>(
        r#"
        UPDATE community_posts
        SET status = 'published',
            published_at = $1,
            scheduled_for = NULL,
            updated_at = $1
        WHERE status = 'scheduled'
          AND scheduled_for <= $1
        RETURNING id
        "#,
    )
    .bind(now)
    .fetch_all(executor)
    .await
}

pub async fn is_published<'e, E>(executor: E, post_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM community_posts WHERE id = $1 AND status = 'published'
        )
        "#,
    )
    .bind(post_id)
    .fetch_one(executor)
    .await
}

/// Drafts and scheduled posts of one author, most recently edited first
pub async fn list_author_queue<'e, E>(executor: E, author_id: Uuid) -> Result<Vec<Post>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, PostRow>(&format!(
        r#"
        SELECT {POST_COLUMNS}
        FROM community_posts
        WHERE user_id = $1 AND status IN ('draft', 'scheduled')
        ORDER BY updated_at DESC, id DESC
        "#
    ))
    .bind(author_id)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(into_post).collect()
}
