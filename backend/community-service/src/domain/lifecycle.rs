//! Post status transition rules
//!
//! draft and scheduled posts can be re-submitted into any status by their
//! author. published is terminal for the author; only engagement attaches
//! to it afterwards. The sweep is the only actor that moves
//! scheduled -> published without an author action.

use crate::domain::models::{Post, PostStatus};
use crate::error::AuthorizationError;
use uuid::Uuid;

impl PostStatus {
    /// Whether the author may still re-submit a post in this status
    pub fn is_editable(&self) -> bool {
        !matches!(self, PostStatus::Published)
    }
}

/// Check that `author_id` may re-submit `post`
pub fn ensure_editable_by(post: &Post, author_id: Uuid) -> Result<(), AuthorizationError> {
    if post.author_id != author_id {
        return Err(AuthorizationError::NotOwner);
    }
    if !post.status.is_editable() {
        return Err(AuthorizationError::AlreadyPublished);
    }
    Ok(())
}
