//! Attachment Store
//!
//! Reconciles the attachments of one post against the kept ids and the new
//! uploads of a submission. Planning is pure; applying the plan runs inside
//! the caller's transaction. Files are removed from storage only after the
//! transaction commits, and a failed unlink never fails the submission.

use crate::domain::models::Attachment;
use crate::error::Rejection;
use crate::metrics;
use crate::repository::attachments as repo;
use chrono::{DateTime, Utc};
use media_storage::{MediaStorage, StoredObject};
use sqlx::PgConnection;
use uuid::Uuid;

/// Row-level changes needed to reach the desired attachment set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// Attachments to drop, rows and files
    pub delete: Vec<Attachment>,
    /// Kept attachments whose position changes
    pub reposition: Vec<(Uuid, i32)>,
    /// Kept ids in their final order
    pub kept: Vec<Uuid>,
    /// Position of the first new upload
    pub append_from: i32,
}

impl ReconciliationPlan {
    pub fn final_len(&self, new_count: usize) -> usize {
        self.kept.len() + new_count
    }
}

/// Plan a reconciliation.
///
/// Kept attachments keep their current relative order regardless of the
/// order of `keep`; ids that do not belong to the post are ignored. Fails
/// before anything is written if the result would exceed `max`.
pub fn plan_reconciliation(
    current: &[Attachment],
    keep: &[Uuid],
    new_count: usize,
    max: usize,
) -> Result<ReconciliationPlan, Rejection> {
    let mut ordered: Vec<&Attachment> = current.iter().collect();
    ordered.sort_by_key(|a| a.position);

    let (kept, delete): (Vec<&Attachment>, Vec<&Attachment>) =
        ordered.into_iter().partition(|a| keep.contains(&a.id));

    if kept.len() + new_count > max {
        return Err(Rejection::TooManyAttachments { max });
    }

    let reposition = kept
        .iter()
        .enumerate()
        .filter(|(idx, a)| a.position != *idx as i32)
        .map(|(idx, a)| (a.id, idx as i32))
        .collect();

    Ok(ReconciliationPlan {
        delete: delete.into_iter().cloned().collect(),
        reposition,
        kept: kept.iter().map(|a| a.id).collect(),
        append_from: kept.len() as i32,
    })
}

/// Apply a plan on an open transaction and return the final ordered set
pub async fn apply_reconciliation(
    conn: &mut PgConnection,
    post_id: Uuid,
    plan: &ReconciliationPlan,
    uploads: &[StoredObject],
    now: DateTime<Utc>,
) -> Result<Vec<Attachment>, sqlx::Error> {
    let doomed: Vec<Uuid> = plan.delete.iter().map(|a| a.id).collect();
    repo::delete_by_ids(&mut *conn, post_id, &doomed).await?;

    for (id, position) in &plan.reposition {
        repo::set_position(&mut *conn, *id, *position).await?;
    }

    for (offset, stored) in uploads.iter().enumerate() {
        repo::insert(
            &mut *conn,
            post_id,
            &stored.key,
            &stored.mime_type,
            plan.append_from + offset as i32,
            now,
        )
        .await?;
    }

    let attachments = repo::list_for_post(&mut *conn, post_id).await?;
    debug_assert!(is_dense(&attachments));
    Ok(attachments)
}

/// Positions are exactly 0..n-1 in order
pub fn is_dense(attachments: &[Attachment]) -> bool {
    attachments
        .iter()
        .enumerate()
        .all(|(idx, a)| a.position == idx as i32)
}

/// Best-effort file removal. Failures are logged and counted, never returned.
pub async fn purge_files(storage: &dyn MediaStorage, keys: &[String]) -> usize {
    let mut removed = 0;
    for key in keys {
        match storage.delete(key).await {
            Ok(()) => removed += 1,
            Err(e) => {
                metrics::record_orphaned_file();
                tracing::warn!(storage_key = %key, error = %e, "Failed to delete media file");
            }
        }
    }
    removed
}
