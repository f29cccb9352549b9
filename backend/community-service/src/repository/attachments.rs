use crate::domain::models::Attachment;
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

pub async fn list_for_post<'e, E>(executor: E, post_id: Uuid) -> Result<Vec<Attachment>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Attachment>(
        r#"
        SELECT id, post_id, storage_key, mime_type, position, created_at
        FROM community_post_attachments
        WHERE post_id = $1
        ORDER BY position ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(executor)
    .await
}

/// All attachments of a set of posts in one round trip, ordered by post then position
pub async fn list_for_posts<'e, E>(
    executor: E,
    post_ids: &[Uuid],
) -> Result<Vec<Attachment>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    if post_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Attachment>(
        r#"
        SELECT id, post_id, storage_key, mime_type, position, created_at
        FROM community_post_attachments
        WHERE post_id = ANY($1)
        ORDER BY post_id, position ASC
        "#,
    )
    .bind(post_ids)
    .fetch_all(executor)
    .await
}

pub async fn delete_by_ids<'e, E>(
    executor: E,
    post_id: Uuid,
    ids: &[Uuid],
) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    if ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        r#"
        DELETE FROM community_post_attachments
        WHERE post_id = $1 AND id = ANY($2)
        "#,
    )
    .bind(post_id)
    .bind(ids)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

pub async fn set_position<'e, E>(executor: E, id: Uuid, position: i32) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE community_post_attachments SET position = $2 WHERE id = $1")
        .bind(id)
        .bind(position)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn insert<'e, E>(
    executor: E,
    post_id: Uuid,
    storage_key: &str,
    mime_type: &str,
    position: i32,
    now: DateTime<Utc>,
) -> Result<Attachment, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Attachment>(
        r#"
        INSERT INTO community_post_attachments
            (id, post_id, storage_key, mime_type, position, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, post_id, storage_key, mime_type, position, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(post_id)
    .bind(storage_key)
    .bind(mime_type)
    .bind(position)
    .bind(now)
    .fetch_one(executor)
    .await
}
