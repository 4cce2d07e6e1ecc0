use super::{upsert_matchup, JobContext};
use crate::error::Result;
use crate::provider::normalize_team_abbr;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct EventsSummary {
    /// Events processed; upserts do not distinguish inserts from updates
    pub inserted: usize,
}

/// Pull the MLB schedule and upsert teams and games.
///
/// The first store failure aborts the run.
pub async fn run(ctx: &JobContext) -> Result<EventsSummary> {
    let events = ctx.provider.fetch_events().await?;
    let mut inserted = 0;

    for event in events {
        let Some(commence_time) = event.commence_time else {
            warn!("Skipping event {} without commence_time", event.id);
            continue;
        };
        if event.id.trim().is_empty() {
            warn!(
                "Skipping event without id ({} @ {})",
                event.away_team, event.home_team
            );
            continue;
        }

        let home = normalize_team_abbr(&event.home_team);
        let away = normalize_team_abbr(&event.away_team);
        upsert_matchup(ctx.store.as_ref(), &event.id, &home, &away, commence_time).await?;
        inserted += 1;
    }

    info!("Events job upserted {} games", inserted);
    Ok(EventsSummary { inserted })
}
