//! Scheduled-post sweeper
//!
//! Feed reads already sweep on demand; this job covers quiet periods when
//! nobody opens the feed. Each run is recorded in `job_runs`, and a cycle is
//! skipped when any instance ran more recently than the interval.

use crate::error::ServiceError;
use crate::hub::CommunityHub;
use crate::metrics;
use crate::repository::jobs as job_repo;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

pub const SWEEP_JOB_NAME: &str = "community_post_sweep";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepReport {
    Ran { promoted: usize },
    Skipped { last_run_at: DateTime<Utc> },
}

/// Run one sweep unless another ran within `interval`. `force` ignores the ledger.
pub async fn run_sweep_cycle(
    hub: &CommunityHub,
    interval: Duration,
    force: bool,
) -> Result<SweepReport, ServiceError> {
    let now = hub.now();

    if !force {
        if let Some(last) = job_repo::last_run(hub.pool(), SWEEP_JOB_NAME).await? {
            let elapsed = now.signed_duration_since(last.last_run_at);
            let min_gap = chrono::Duration::from_std(interval)
                .map_err(|e| ServiceError::Internal(e.to_string()))?;
            if elapsed < min_gap {
                metrics::record_sweep_run("skipped");
                tracing::debug!(
                    last_run_at = %last.last_run_at,
                    "Sweep ran recently, skipping cycle"
                );
                return Ok(SweepReport::Skipped {
                    last_run_at: last.last_run_at,
                });
            }
        }
    }

    match hub.sweep_due_posts().await {
        Ok(promoted) => {
            job_repo::record_run(
                hub.pool(),
                SWEEP_JOB_NAME,
                now,
                "success",
                promoted.len() as i64,
            )
            .await?;
            metrics::record_sweep_run("success");
            Ok(SweepReport::Ran {
                promoted: promoted.len(),
            })
        }
        Err(e) => {
            metrics::record_sweep_run("error");
            if let Err(record_err) =
                job_repo::record_run(hub.pool(), SWEEP_JOB_NAME, now, "error", 0).await
            {
                tracing::warn!(error = %record_err, "Failed to record sweep failure");
            }
            Err(e)
        }
    }
}

pub async fn start_sweeper(hub: Arc<CommunityHub>, interval: Duration) {
    tracing::info!(
        "Starting scheduled-post sweeper (interval={}s)",
        interval.as_secs()
    );

    loop {
        let cycle_start = Instant::now();

        match run_sweep_cycle(&hub, interval, false).await {
            Ok(SweepReport::Ran { promoted }) => {
                tracing::info!(
                    promoted,
                    duration_ms = cycle_start.elapsed().as_millis(),
                    "Sweep cycle completed"
                );
            }
            Ok(SweepReport::Skipped { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    duration_ms = cycle_start.elapsed().as_millis(),
                    "Sweep cycle failed"
                );
            }
        }

        sleep(interval).await;
    }
}
