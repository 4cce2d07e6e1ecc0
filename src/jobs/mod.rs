//! Ingestion jobs and the refresh orchestrator.

pub mod cleanup;
pub mod events;
pub mod odds;
pub mod participants;
pub mod refresh;

use crate::calendar::local_date;
use crate::config::SPORT_KEY;
use crate::error::Result;
use crate::provider::{team_id_for_abbr, OddsProvider};
use crate::store::{Game, Store, Team};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

pub use cleanup::CleanupOutcome;
pub use events::EventsSummary;
pub use odds::OddsSummary;
pub use participants::ParticipantsSummary;
pub use refresh::{JobReport, RefreshReport};

/// Store and provider handles, built once at start-up and shared by every job
#[derive(Clone)]
pub struct JobContext {
    pub store: Arc<dyn Store>,
    pub provider: Arc<dyn OddsProvider>,
}

impl JobContext {
    pub fn new(store: Arc<dyn Store>, provider: Arc<dyn OddsProvider>) -> Self {
        Self { store, provider }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Events,
    Participants,
    Odds,
    Cleanup,
}

impl Job {
    /// Order the refresh runs them in
    pub const REFRESH_ORDER: [Job; 4] = [Job::Events, Job::Participants, Job::Odds, Job::Cleanup];

    pub fn path(&self) -> &'static str {
        match self {
            Job::Events => "/jobs/events",
            Job::Participants => "/jobs/participants",
            Job::Odds => "/jobs/odds",
            Job::Cleanup => "/jobs/cleanup",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum JobSummary {
    Events(EventsSummary),
    Participants(ParticipantsSummary),
    Odds(OddsSummary),
    Cleanup(CleanupOutcome),
}

/// Success body of a job endpoint: `{"ok": true, ...summary}`
#[derive(Debug, Clone, Serialize)]
pub struct JobReply {
    pub ok: bool,
    #[serde(flatten)]
    pub summary: JobSummary,
}

impl From<JobSummary> for JobReply {
    fn from(summary: JobSummary) -> Self {
        Self { ok: true, summary }
    }
}

/// Run one job to completion. `force` only affects cleanup.
pub async fn run_job(ctx: &JobContext, job: Job, now: DateTime<Utc>, force: bool) -> Result<JobSummary> {
    Ok(match job {
        Job::Events => JobSummary::Events(events::run(ctx).await?),
        Job::Participants => JobSummary::Participants(participants::run(ctx, now).await?),
        Job::Odds => JobSummary::Odds(odds::run(ctx, now).await?),
        Job::Cleanup => JobSummary::Cleanup(cleanup::run(ctx, now, force).await?),
    })
}

/// Upsert both teams, then the game row
pub(crate) async fn upsert_matchup(
    store: &dyn Store,
    game_id: &str,
    home_team: &str,
    away_team: &str,
    commence_time: DateTime<Utc>,
) -> Result<()> {
    for abbr in [home_team, away_team] {
        store
            .upsert_team(&Team {
                abbr: abbr.to_string(),
                team_id: team_id_for_abbr(abbr),
            })
            .await?;
    }

    store
        .upsert_game(&Game {
            game_id: game_id.to_string(),
            sport_key: SPORT_KEY.to_string(),
            game_date: local_date(commence_time),
            commence_time,
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
        })
        .await
}
