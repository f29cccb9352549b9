use crate::domain::models::ReactionType;
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

pub async fn exists<'e, E>(
    executor: E,
    post_id: Uuid,
    user_id: Uuid,
    reaction: ReactionType,
) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM community_post_reactions
            WHERE post_id = $1 AND user_id = $2 AND reaction_type = $3
        )
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .bind(reaction.as_str())
    .fetch_one(executor)
    .await
}

/// Insert a reaction row. A concurrent insert of the same key is a no-op;
/// returns whether this call created the row.
pub async fn insert<'e, E>(
    executor: E,
    post_id: Uuid,
    user_id: Uuid,
    reaction: ReactionType,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO community_post_reactions (post_id, user_id, reaction_type, created_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (post_id, user_id, reaction_type) DO NOTHING
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .bind(reaction.as_str())
    .bind(now)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete<'e, E>(
    executor: E,
    post_id: Uuid,
    user_id: Uuid,
    reaction: ReactionType,
) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        DELETE FROM community_post_reactions
        WHERE post_id = $1 AND user_id = $2 AND reaction_type = $3
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .bind(reaction.as_str())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
