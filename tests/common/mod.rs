#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use mlb_hr_odds::jobs::JobContext;
use mlb_hr_odds::provider::{OddsProvider, RawGameOdds, UpstreamEvent};
use mlb_hr_odds::store::{
    Game, GameParticipant, HistoryQuery, MemoryStore, OddsHistorySample, OddsQuote, Player, PurgeCounts, Store,
    TableCounts, Team,
};
use mlb_hr_odds::{IngestError, Result};
use serde_json::{json, Value};
use std::sync::Arc;

/// Provider that serves canned payloads, or fails with a fixed status
#[derive(Default)]
pub struct StaticProvider {
    pub events: Vec<UpstreamEvent>,
    pub odds: Vec<RawGameOdds>,
    pub events_failure: Option<u16>,
    pub odds_failure: Option<u16>,
}

#[async_trait]
impl OddsProvider for StaticProvider {
    async fn fetch_events(&self) -> Result<Vec<UpstreamEvent>> {
        match self.events_failure {
            Some(status) => Err(IngestError::Upstream {
                status,
                body: "events unavailable".into(),
            }),
            None => Ok(self.events.clone()),
        }
    }

    async fn fetch_player_home_run_odds(&self) -> Result<Vec<RawGameOdds>> {
        match self.odds_failure {
            Some(status) => Err(IngestError::Upstream {
                status,
                body: "odds unavailable".into(),
            }),
            None => Ok(self.odds.clone()),
        }
    }
}

pub fn context(provider: StaticProvider) -> (JobContext, MemoryStore) {
    let store = MemoryStore::new();
    let ctx = JobContext::new(Arc::new(store.clone()), Arc::new(provider));
    (ctx, store)
}

/// `MemoryStore` that fails selected operations with `IngestError::Store`
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    /// The per-local-date games view errors
    pub fail_local_date_view: bool,
    /// `upsert_game` errors for this game id
    pub fail_game: Option<String>,
    /// Participant batches for this game id error
    pub fail_participants_for: Option<String>,
    /// Every quote upsert errors
    pub fail_quotes: bool,
}

fn injected(op: &str) -> IngestError {
    IngestError::Store(format!("injected {} failure", op))
}

#[async_trait]
impl Store for FlakyStore {
    async fn upsert_team(&self, team: &Team) -> Result<()> {
        self.inner.upsert_team(team).await
    }

    async fn upsert_game(&self, game: &Game) -> Result<()> {
        if self.fail_game.as_deref() == Some(game.game_id.as_str()) {
            return Err(injected("game upsert"));
        }
        self.inner.upsert_game(game).await
    }

    async fn upsert_player(&self, player: &Player) -> Result<()> {
        self.inner.upsert_player(player).await
    }

    async fn upsert_participant(&self, row: &GameParticipant) -> Result<()> {
        self.inner.upsert_participant(row).await
    }

    async fn upsert_participants(&self, rows: &[GameParticipant]) -> Result<usize> {
        if let Some(game_id) = &self.fail_participants_for {
            if rows.iter().any(|r| &r.game_id == game_id) {
                return Err(injected("participant batch"));
            }
        }
        self.inner.upsert_participants(rows).await
    }

    async fn upsert_quote(&self, quote: &OddsQuote) -> Result<()> {
        if self.fail_quotes {
            return Err(injected("quote upsert"));
        }
        self.inner.upsert_quote(quote).await
    }

    async fn insert_history(&self, sample: &OddsHistorySample) -> Result<()> {
        self.inner.insert_history(sample).await
    }

    async fn games_on_local_date(&self, date: NaiveDate) -> Result<Vec<Game>> {
        if self.fail_local_date_view {
            return Err(injected("games_by_local_date view"));
        }
        self.inner.games_on_local_date(date).await
    }

    async fn games_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Game>> {
        self.inner.games_between(start, end).await
    }

    async fn players_on_team(&self, spellings: &[String]) -> Result<Vec<Player>> {
        self.inner.players_on_team(spellings).await
    }

    async fn player_ids_with_odds(&self, game_id: &str) -> Result<Vec<String>> {
        self.inner.player_ids_with_odds(game_id).await
    }

    async fn players_by_ids(&self, player_ids: &[String]) -> Result<Vec<Player>> {
        self.inner.players_by_ids(player_ids).await
    }

    async fn purge_before(&self, today: NaiveDate) -> Result<PurgeCounts> {
        self.inner.purge_before(today).await
    }

    async fn list_games(&self, game_date: NaiveDate) -> Result<Vec<Game>> {
        self.inner.list_games(game_date).await
    }

    async fn list_game_players(&self, game_id: &str) -> Result<Vec<Player>> {
        self.inner.list_game_players(game_id).await
    }

    async fn odds_history(&self, query: &HistoryQuery) -> Result<Vec<OddsHistorySample>> {
        self.inner.odds_history(query).await
    }

    async fn table_counts(&self) -> Result<TableCounts> {
        self.inner.table_counts().await
    }
}

pub fn flaky_context(store: FlakyStore, provider: StaticProvider) -> JobContext {
    JobContext::new(Arc::new(store), Arc::new(provider))
}

/// Noon EDT on July 4th, 2024
pub fn noon_july_4() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 4, 16, 0, 0).unwrap()
}

pub fn events_fixture() -> Vec<UpstreamEvent> {
    serde_json::from_value(json!([
        {
            "id": "evt-nyy-bos",
            "sport_key": "baseball_mlb",
            "commence_time": "2024-07-04T23:05:00Z",
            "home_team": "New York Yankees",
            "away_team": "Boston Red Sox"
        },
        {
            // 9:10pm PDT start is already July 5th in UTC
            "id": "evt-lad-sf",
            "sport_key": "baseball_mlb",
            "commence_time": "2024-07-05T01:10:00Z",
            "home_team": "Los Angeles Dodgers",
            "away_team": "San Francisco Giants"
        }
    ]))
    .unwrap()
}

fn outcome(name: &str, id: &str, price: i64) -> Value {
    json!({ "name": "Yes", "description": name, "player_id": id, "price": price })
}

/// One game, three books (one not allowed), plus a market that is not home runs
pub fn odds_fixture() -> Vec<RawGameOdds> {
    serde_json::from_value(json!([
        {
            "id": "evt-nyy-bos",
            "sport_key": "baseball_mlb",
            "commence_time": "2024-07-04T23:05:00Z",
            "home_team": "New York Yankees",
            "away_team": "Boston Red Sox",
            "bookmakers": [
                {
                    "key": "fanduel",
                    "title": "FanDuel",
                    "markets": [
                        { "key": "player_home_run", "outcomes": [
                            outcome("Aaron Judge", "592450", 210),
                            outcome("Rafael Devers", "646240", 380)
                        ]},
                        { "key": "batter_hits", "outcomes": [
                            outcome("Aaron Judge", "592450", -180)
                        ]}
                    ]
                },
                {
                    "key": "betmgm",
                    "title": "BetMGM",
                    "markets": [
                        { "key": "player_home_run", "outcomes": [
                            outcome("Aaron Judge", "592450", 200)
                        ]}
                    ]
                },
                {
                    "key": "draftkings",
                    "title": "DraftKings",
                    "markets": [
                        { "key": "player_home_run", "outcomes": [
                            outcome("Aaron Judge", "592450", 215)
                        ]}
                    ]
                }
            ]
        }
    ]))
    .unwrap()
}
