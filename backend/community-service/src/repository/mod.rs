//! Postgres access, one module per table group.
//!
//! Functions take any `PgExecutor` so the same query runs against the pool
//! or inside an open transaction (`&mut *tx`).

pub mod attachments;
pub mod comments;
pub mod feed;
pub mod jobs;
pub mod posts;
pub mod reactions;
