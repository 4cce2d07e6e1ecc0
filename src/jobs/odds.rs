use super::{upsert_matchup, JobContext};
use crate::error::Result;
use crate::provider::{american_to_decimal, is_allowed_book, RawGameOdds, PLAYER_HOME_RUN_MARKET};
use crate::store::{GameParticipant, OddsHistorySample, OddsQuote, Player};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct OddsSummary {
    /// Live quotes written
    pub upserts: usize,
    /// History rows appended
    pub snapshots: usize,
    /// Successful player upserts, first-time or not
    #[serde(rename = "newPlayers")]
    pub new_players: usize,
}

/// Pull player home-run odds and write players, participants, quotes and history.
///
/// Writes for one outcome run in order (player, participant, quote, history);
/// the first store failure aborts the run. All history rows share `now`, and
/// a key appears at most once per run (first priced outcome wins).
pub async fn run(ctx: &JobContext, now: DateTime<Utc>) -> Result<OddsSummary> {
    let raw = ctx.provider.fetch_player_home_run_odds().await?;
    let store = ctx.store.as_ref();

    let mut summary = OddsSummary {
        upserts: 0,
        snapshots: 0,
        new_players: 0,
    };

    for game in raw.into_iter().filter_map(RawGameOdds::into_canonical) {
        let game_id = game.game_id();
        upsert_matchup(store, &game_id, &game.home_team, &game.away_team, game.commence_time).await?;

        let quotes = game
            .quotes
            .iter()
            .filter(|q| is_allowed_book(&q.bookmaker) && q.market_key == PLAYER_HOME_RUN_MARKET);

        // One quote and one history row per (bookmaker, market, player) per run
        let mut seen = HashSet::new();

        for quote in quotes {
            let player = &quote.player;
            if !seen.insert((quote.bookmaker.as_str(), quote.market_key.as_str(), player.player_id.as_str())) {
                debug!(
                    "Skipping repeated {} quote for {} in game {}",
                    quote.bookmaker, player.player_id, game_id
                );
                continue;
            }

            store
                .upsert_player(&Player {
                    player_id: player.player_id.clone(),
                    full_name: player.full_name.clone(),
                    team_abbr: player.team_abbr.clone(),
                })
                .await?;
            summary.new_players += 1;

            store
                .upsert_participant(&GameParticipant {
                    game_id: game_id.clone(),
                    player_id: player.player_id.clone(),
                    team_abbr: player.team_abbr.clone(),
                })
                .await?;

            let decimal_odds = american_to_decimal(quote.american_odds);

            store
                .upsert_quote(&OddsQuote {
                    market_key: quote.market_key.clone(),
                    player_id: player.player_id.clone(),
                    game_id: game_id.clone(),
                    bookmaker: quote.bookmaker.clone(),
                    american_odds: quote.american_odds,
                    decimal_odds,
                    updated_at: now,
                })
                .await?;
            summary.upserts += 1;

            store
                .insert_history(&OddsHistorySample {
                    market_key: quote.market_key.clone(),
                    player_id: player.player_id.clone(),
                    game_id: game_id.clone(),
                    bookmaker: quote.bookmaker.clone(),
                    american_odds: quote.american_odds,
                    decimal_odds,
                    captured_at: now,
                })
                .await?;
            summary.snapshots += 1;
        }

        debug!("Processed odds for game {}", game_id);
    }

    info!(
        "Odds job: {} quotes, {} snapshots, {} player upserts",
        summary.upserts, summary.snapshots, summary.new_players
    );
    Ok(summary)
}
