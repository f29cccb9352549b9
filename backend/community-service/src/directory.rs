//! User directory lookup
//!
//! Accounts are owned by the identity provider. This core only reads them
//! to resolve @mentions and to join author cards onto posts and comments.

use crate::domain::models::Author;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;

/// Lowercased handle -> account
pub type ResolvedHandles = HashMap<String, Author>;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up accounts by handle, case-insensitively.
    ///
    /// Unknown handles are simply absent from the result.
    async fn find_users_by_handles(&self, handles: &[String]) -> sqlx::Result<ResolvedHandles>;
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: uuid::Uuid,
    username: String,
    badge: Option<String>,
}

/// Directory backed by the shared `users` table
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_users_by_handles(&self, handles: &[String]) -> sqlx::Result<ResolvedHandles> {
        if handles.is_empty() {
            return Ok(HashMap::new());
        }

        let lowered: Vec<String> = handles.iter().map(|h| h.to_lowercase()).collect();

        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, badge
            FROM users
            WHERE LOWER(username) = ANY($1)
            "#,
        )
        .bind(&lowered)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.username.to_lowercase(),
                    Author {
                        id: row.id,
                        username: row.username,
                        badge: row.badge,
                    },
                )
            })
            .collect())
    }
}
