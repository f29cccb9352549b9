//! Prometheus metrics for the post lifecycle engine
//!
//! Registered in the default registry; the host process exposes them.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};
use std::time::Duration;

/// Posts written by the composer, by resulting status
static POSTS_SUBMITTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "community_posts_submitted_total",
        "Composer submissions persisted, by resulting status",
        &["status", "content_type"]
    )
    .expect("failed to register community_posts_submitted_total")
});

/// Rejected operations, by reason kind
static REJECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "community_rejections_total",
        "Operations rejected by validation or authorization",
        &["operation", "kind"]
    )
    .expect("failed to register community_rejections_total")
});

/// Storage and persistence faults
static FAULTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "community_faults_total",
        "Storage and persistence faults",
        &["operation", "kind"]
    )
    .expect("failed to register community_faults_total")
});

static REACTIONS_TOGGLED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "community_reactions_toggled_total",
        "Reaction toggles, by type and outcome",
        &["reaction_type", "outcome"]
    )
    .expect("failed to register community_reactions_toggled_total")
});

static COMMENTS_ADDED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "community_comments_added_total",
        "Comments added, by target",
        &["target"]
    )
    .expect("failed to register community_comments_added_total")
});

/// Sweep runs (success/error/skipped)
static SWEEP_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "community_sweep_runs_total",
        "Scheduled-post sweep runs",
        &["status"]
    )
    .expect("failed to register community_sweep_runs_total")
});

static POSTS_PROMOTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "community_posts_promoted_total",
        "Scheduled posts promoted to published"
    )
    .expect("failed to register community_posts_promoted_total")
});

/// Files that could not be unlinked after their attachment row went away
static ORPHANED_FILES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "community_orphaned_files_total",
        "Media files left behind after a failed delete"
    )
    .expect("failed to register community_orphaned_files_total")
});

static OPERATION_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "community_operation_duration_seconds",
        "Duration of hub operations",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("failed to register community_operation_duration_seconds")
});

pub fn record_post_submitted(status: &str, content_type: &str) {
    POSTS_SUBMITTED_TOTAL
        .with_label_values(&[status, content_type])
        .inc();
}

pub fn record_rejection(operation: &str, kind: &str) {
    REJECTIONS_TOTAL.with_label_values(&[operation, kind]).inc();
}

pub fn record_fault(operation: &str, kind: &str) {
    FAULTS_TOTAL.with_label_values(&[operation, kind]).inc();
}

pub fn record_reaction_toggled(reaction_type: &str, outcome: &str) {
    REACTIONS_TOGGLED_TOTAL
        .with_label_values(&[reaction_type, outcome])
        .inc();
}

pub fn record_comment_added(target: &str) {
    COMMENTS_ADDED_TOTAL.with_label_values(&[target]).inc();
}

pub fn record_sweep_run(status: &str) {
    SWEEP_RUNS_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_posts_promoted(count: u64) {
    POSTS_PROMOTED_TOTAL.inc_by(count);
}

pub fn record_orphaned_file() {
    ORPHANED_FILES_TOTAL.inc();
}

pub fn record_duration(operation: &str, duration: Duration) {
    OPERATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}
