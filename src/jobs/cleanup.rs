use super::JobContext;
use crate::calendar::{in_cleanup_window, local_date, LOCAL_TZ_NAME};
use crate::error::Result;
use crate::store::PurgeCounts;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    pub purged_before_local_date: NaiveDate,
    pub forced: bool,
    pub deleted: PurgeCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupSkipped {
    pub skipped: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CleanupOutcome {
    Purged(CleanupReport),
    Skipped(CleanupSkipped),
}

/// Purge rows dated before today (US-Eastern).
///
/// Without `force` this only runs during the first minute after local midnight.
pub async fn run(ctx: &JobContext, now: DateTime<Utc>, force: bool) -> Result<CleanupOutcome> {
    if !force && !in_cleanup_window(now) {
        debug!("Cleanup skipped: outside midnight window");
        return Ok(CleanupOutcome::Skipped(CleanupSkipped {
            skipped: format!("outside the 00:00-00:01 {} window; pass force=1 to override", LOCAL_TZ_NAME),
        }));
    }

    let today = local_date(now);
    let deleted = ctx.store.purge_before(today).await?;

    info!(
        "Cleanup before {} (forced: {}): {} history, {} quotes, {} participants, {} games",
        today, force, deleted.odds_history, deleted.odds, deleted.game_participants, deleted.games
    );

    Ok(CleanupOutcome::Purged(CleanupReport {
        purged_before_local_date: today,
        forced: force,
        deleted,
    }))
}
