//! In-process schedule: periodic refresh plus the nightly cleanup check.
//!
//! The cleanup check runs on its own task so a long refresh cannot hold it
//! past the one-minute midnight window.

use crate::api::HealthState;
use crate::jobs::{cleanup, refresh, CleanupOutcome, JobContext};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Cleanup only runs inside a one-minute window, so check twice a minute
const CLEANUP_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// `tokio::time::interval` panics on a zero period
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

type Clock = fn() -> DateTime<Utc>;

pub async fn run(ctx: JobContext, health: HealthState, poll_interval: Duration) {
    run_with_clock(ctx, health, poll_interval, CLEANUP_CHECK_INTERVAL, Utc::now).await
}

/// Aborts the cleanup task when the scheduler future is dropped
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn run_with_clock(
    ctx: JobContext,
    health: HealthState,
    poll_interval: Duration,
    cleanup_interval: Duration,
    clock: Clock,
) {
    let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
    info!(
        "Starting scheduler (refresh every {}s, cleanup check every {}s)",
        poll_interval.as_secs(),
        cleanup_interval.as_secs()
    );

    let _cleanup = AbortOnDrop(tokio::spawn(cleanup_checks(ctx.clone(), cleanup_interval, clock)));

    let mut refresh_tick = tokio::time::interval(poll_interval);
    refresh_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        refresh_tick.tick().await;

        let start = Instant::now();
        let report = refresh::run(&ctx, clock(), false).await;
        health.record_refresh(&report).await;
        if report.ok {
            info!("Scheduled refresh {} completed in {:?}", report.run_id, start.elapsed());
        } else {
            let failed: Vec<&str> = report.results.iter().filter(|r| !r.ok).map(|r| r.path).collect();
            error!("Scheduled refresh {} had failures: {:?}", report.run_id, failed);
        }
    }
}

async fn cleanup_checks(ctx: JobContext, interval: Duration, clock: Clock) {
    let mut tick = tokio::time::interval(interval.max(Duration::from_millis(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tick.tick().await;
        match cleanup::run(&ctx, clock(), false).await {
            Ok(CleanupOutcome::Purged(report)) => {
                info!("Nightly cleanup purged rows before {}", report.purged_before_local_date);
            }
            Ok(CleanupOutcome::Skipped(_)) => {}
            Err(e) => error!("Nightly cleanup failed: {}", e),
        }
    }
}
