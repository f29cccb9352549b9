//! Outward facade of the post lifecycle engine
//!
//! Page rendering and cron entry points call the hub only. It gates
//! mutations on the request context, reads time from the injected clock and
//! logs each outcome: rejections at debug, faults at error.

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, FeedConfig};
use crate::db::{create_pool, run_migrations, DbConfig};
use crate::directory::{PgUserDirectory, UserDirectory};
use crate::domain::intent::{ComposerInput, EditablePost};
use crate::domain::models::{Comment, CommentTarget, ReactionType, ToggleOutcome};
use crate::error::{AuthorizationError, ServiceResult};
use crate::identity::RequestContext;
use crate::metrics;
use crate::services::{
    CommentView, ComposerValidator, EngagementLedger, FeedAssembler, FeedPost, MentionResolver,
    PostLifecycleService, SubmitOutcome,
};
use anyhow::Context;
use media_storage::{LocalMediaStorage, MediaStorage, S3MediaStorage, StorageBackend};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

pub struct CommunityHub {
    pool: PgPool,
    clock: Arc<dyn Clock>,
    lifecycle: Arc<PostLifecycleService>,
    engagement: EngagementLedger,
    feed: FeedAssembler,
    feed_config: FeedConfig,
}

impl CommunityHub {
    /// Connect to Postgres, apply migrations and build the configured storage backend
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let pool = create_pool(&DbConfig::from(&config.database))
            .await
            .context("Failed to create database pool")?;
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        let storage = build_storage(config).await;
        let directory: Arc<dyn UserDirectory> = Arc::new(PgUserDirectory::new(pool.clone()));

        Ok(Self::new(pool, storage, directory, Arc::new(SystemClock), config))
    }

    pub fn new(
        pool: PgPool,
        storage: Arc<dyn MediaStorage>,
        directory: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        let validator = ComposerValidator::new(config.composer.clone());
        let lifecycle = Arc::new(PostLifecycleService::new(
            pool.clone(),
            storage.clone(),
            validator,
        ));
        let mentions = Arc::new(MentionResolver::new(
            directory,
            config.mentions.profile_url_prefix.clone(),
        ));
        let feed = FeedAssembler::new(
            pool.clone(),
            lifecycle.clone(),
            mentions,
            storage,
            config.feed.max_limit,
        );

        Self {
            engagement: EngagementLedger::new(pool.clone()),
            pool,
            clock,
            lifecycle,
            feed,
            feed_config: config.feed.clone(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Validate and persist a composer submission
    pub async fn submit_post(
        &self,
        ctx: &RequestContext,
        input: ComposerInput,
    ) -> ServiceResult<SubmitOutcome> {
        let started = Instant::now();
        let result: ServiceResult<SubmitOutcome> = async {
            let user = ctx.require_mutation()?;
            self.lifecycle
                .compose(user.id, input, self.clock.now())
                .await
        }
        .await;
        observe("submit_post", started, &result);
        result
    }

    pub async fn toggle_reaction(
        &self,
        ctx: &RequestContext,
        post_id: Uuid,
        reaction: ReactionType,
    ) -> ServiceResult<ToggleOutcome> {
        let started = Instant::now();
        let result: ServiceResult<ToggleOutcome> = async {
            let user = ctx.require_mutation()?;
            self.engagement
                .toggle_reaction(post_id, user.id, reaction, self.clock.now())
                .await
        }
        .await;
        observe("toggle_reaction", started, &result);
        result
    }

    pub async fn add_comment(
        &self,
        ctx: &RequestContext,
        target: CommentTarget,
        body: &str,
    ) -> ServiceResult<Comment> {
        let started = Instant::now();
        let result: ServiceResult<Comment> = async {
            let user = ctx.require_mutation()?;
            self.engagement
                .add_comment(target, user.id, body, self.clock.now())
                .await
        }
        .await;
        observe("add_comment", started, &result);
        result
    }

    /// Feed page for the viewer in `ctx`; anonymous viewers see no reaction state
    pub async fn get_feed_page(
        &self,
        ctx: &RequestContext,
        offset: i64,
        limit: Option<i64>,
    ) -> ServiceResult<Vec<FeedPost>> {
        let started = Instant::now();
        let limit = limit.unwrap_or(self.feed_config.default_limit);
        let result = self
            .feed
            .get_feed_page(ctx.viewer_id(), offset, limit, self.clock.now())
            .await;
        observe("get_feed_page", started, &result);
        result
    }

    pub async fn get_post(&self, ctx: &RequestContext, post_id: Uuid) -> ServiceResult<FeedPost> {
        let started = Instant::now();
        let result = self
            .feed
            .get_post(ctx.viewer_id(), post_id, self.clock.now())
            .await;
        observe("get_post", started, &result);
        result
    }

    pub async fn list_comments(
        &self,
        target: CommentTarget,
        offset: i64,
        limit: Option<i64>,
    ) -> ServiceResult<Vec<CommentView>> {
        let started = Instant::now();
        let limit = limit.unwrap_or(self.feed_config.default_limit);
        let result = self.feed.list_comments(target, offset, limit).await;
        observe("list_comments", started, &result);
        result
    }

    /// Reopen one of the caller's drafts or scheduled posts
    pub async fn load_editable(
        &self,
        ctx: &RequestContext,
        post_id: Uuid,
    ) -> ServiceResult<EditablePost> {
        let started = Instant::now();
        let result: ServiceResult<EditablePost> = async {
            let user = ctx.user.as_ref().ok_or(AuthorizationError::Unauthenticated)?;
            self.lifecycle.load_editable(post_id, user.id).await
        }
        .await;
        observe("load_editable", started, &result);
        result
    }

    pub async fn list_author_queue(&self, ctx: &RequestContext) -> ServiceResult<Vec<EditablePost>> {
        let started = Instant::now();
        let result: ServiceResult<Vec<EditablePost>> = async {
            let user = ctx.user.as_ref().ok_or(AuthorizationError::Unauthenticated)?;
            self.lifecycle.list_author_queue(user.id).await
        }
        .await;
        observe("list_author_queue", started, &result);
        result
    }

    /// Promote due scheduled posts; used by cron entry points
    pub async fn sweep_due_posts(&self) -> ServiceResult<Vec<Uuid>> {
        let started = Instant::now();
        let result = self.lifecycle.sweep_due_posts(self.clock.now()).await;
        observe("sweep_due_posts", started, &result);
        result
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }
}

async fn build_storage(config: &Config) -> Arc<dyn MediaStorage> {
    match config.storage.backend {
        StorageBackend::Local => {
            tracing::info!(root = %config.storage.local_root.display(), "Using local media storage");
            Arc::new(LocalMediaStorage::from_config(&config.storage))
        }
        StorageBackend::S3 => {
            tracing::info!(bucket = %config.storage.s3_bucket, "Using S3 media storage");
            Arc::new(S3MediaStorage::from_env(config.storage.clone()).await)
        }
    }
}

fn observe<T>(operation: &'static str, started: Instant, result: &ServiceResult<T>) {
    metrics::record_duration(operation, started.elapsed());

    if let Err(e) = result {
        if e.is_fault() {
            metrics::record_fault(operation, e.kind());
            tracing::error!(operation, error = %e, "Operation failed");
        } else {
            metrics::record_rejection(operation, e.kind());
            tracing::debug!(operation, reason = e.kind(), "Operation rejected");
        }
    }
}
