//! Link players to games.
//!
//! Two passes over the games in scope: match players to games by team
//! abbreviation, then backfill participant rows for players that already
//! have odds on a game. A failed batch is logged and counted, never fatal.

use super::JobContext;
use crate::calendar::{local_date, participant_window};
use crate::error::Result;
use crate::store::{Game, GameParticipant, Store};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantsSummary {
    pub games: usize,
    /// Rows written by the team pass
    pub upserts: usize,
    /// Rows written by the odds backfill
    pub backfills: usize,
    /// Batches that failed to read or write
    pub failed: usize,
    pub message: String,
}

pub async fn run(ctx: &JobContext, now: DateTime<Utc>) -> Result<ParticipantsSummary> {
    let store = ctx.store.as_ref();
    let games = games_in_scope(store, now).await?;

    if games.is_empty() {
        info!("Participants job: no games in scope");
        return Ok(ParticipantsSummary {
            games: 0,
            upserts: 0,
            backfills: 0,
            failed: 0,
            message: "No games in scope".to_string(),
        });
    }

    let mut upserts = 0;
    let mut backfills = 0;
    let mut failed = 0;

    for game in &games {
        match link_by_team(store, game).await {
            Ok(n) => upserts += n,
            Err(e) => {
                failed += 1;
                warn!("Team linking failed for game {}: {}", game.game_id, e);
            }
        }
    }

    for game in &games {
        match backfill_from_odds(store, game).await {
            Ok(n) => backfills += n,
            Err(e) => {
                failed += 1;
                warn!("Odds backfill failed for game {}: {}", game.game_id, e);
            }
        }
    }

    let message = format!(
        "Linked {} players and backfilled {} across {} games ({} failed batches)",
        upserts,
        backfills,
        games.len(),
        failed
    );
    info!("Participants job: {}", message);

    Ok(ParticipantsSummary {
        games: games.len(),
        upserts,
        backfills,
        failed,
        message,
    })
}

/// Today's games (US-Eastern) from the per-date view, or the fixed window if the view query fails
async fn games_in_scope(store: &dyn Store, now: DateTime<Utc>) -> Result<Vec<Game>> {
    match store.games_on_local_date(local_date(now)).await {
        Ok(games) => Ok(games),
        Err(e) => {
            warn!("Today's games view unavailable ({}); falling back to time window", e);
            let (start, end) = participant_window(now);
            store.games_between(start, end).await
        }
    }
}

/// Raw, upper-cased and lower-cased spellings of a team code
pub fn team_spellings(abbr: &str) -> Vec<String> {
    let raw = abbr.trim().to_string();
    let mut out = vec![raw.clone(), raw.to_uppercase(), raw.to_lowercase()];
    out.sort();
    out.dedup();
    out.retain(|s| !s.is_empty());
    out
}

async fn link_by_team(store: &dyn Store, game: &Game) -> Result<usize> {
    let mut spellings = team_spellings(&game.home_team);
    spellings.extend(team_spellings(&game.away_team));

    let players = store.players_on_team(&spellings).await?;
    let rows: Vec<GameParticipant> = players
        .into_iter()
        .map(|p| {
            let team = p.team_abbr.unwrap_or_default();
            let side = if team.eq_ignore_ascii_case(&game.home_team) {
                &game.home_team
            } else {
                &game.away_team
            };
            GameParticipant {
                game_id: game.game_id.clone(),
                player_id: p.player_id,
                team_abbr: Some(side.clone()),
            }
        })
        .collect();

    store.upsert_participants(&rows).await
}

async fn backfill_from_odds(store: &dyn Store, game: &Game) -> Result<usize> {
    let player_ids = store.player_ids_with_odds(&game.game_id).await?;
    if player_ids.is_empty() {
        return Ok(0);
    }

    let players = store.players_by_ids(&player_ids).await?;
    let rows: Vec<GameParticipant> = players
        .into_iter()
        .map(|p| GameParticipant {
            game_id: game.game_id.clone(),
            player_id: p.player_id,
            team_abbr: p.team_abbr,
        })
        .collect();

    store.upsert_participants(&rows).await
}
