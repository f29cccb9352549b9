/// Community Service Library
///
/// Post lifecycle engine for the fan community feed: the composer
/// (text, photo/gallery and poll posts), draft and scheduled publishing,
/// ordered multi-image attachments, @mentions, reactions, comments and the
/// viewer-scoped feed.
///
/// # Modules
///
/// - `domain`: Post, attachment, reaction and comment models plus the
///   validated post intent and status transition rules
/// - `services`: Composer validation, lifecycle, attachments, mentions,
///   engagement ledger and feed assembly
/// - `repository`: Postgres access per table group
/// - `hub`: Outward facade consumed by page rendering and cron entry points
/// - `jobs`: Scheduled-post sweeper loop
/// - `error`: Error taxonomy and user-facing messages
/// - `config`: Configuration management
/// - `metrics`: Prometheus metrics
pub mod clock;
pub mod config;
pub mod db;
pub mod directory;
pub mod domain;
pub mod error;
pub mod hub;
pub mod identity;
pub mod jobs;
pub mod metrics;
pub mod repository;
pub mod services;

pub use config::Config;
pub use error::{AuthorizationError, Rejection, ServiceError, ServiceResult};
pub use hub::CommunityHub;
