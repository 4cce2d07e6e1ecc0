//! Relational store for games, players and odds.
//!
//! Every write is an upsert keyed by the table's unique constraint except
//! `insert_history`, which appends. The jobs rely on that for idempotency.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub abbr: String,
    pub team_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Game {
    pub game_id: String,
    pub sport_key: String,
    pub game_date: NaiveDate,
    pub commence_time: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Player {
    pub player_id: String,
    pub full_name: String,
    pub team_abbr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct GameParticipant {
    pub game_id: String,
    pub player_id: String,
    pub team_abbr: Option<String>,
}

/// Latest quote per (market_key, player_id, game_id, bookmaker)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OddsQuote {
    pub market_key: String,
    pub player_id: String,
    pub game_id: String,
    pub bookmaker: String,
    pub american_odds: i32,
    pub decimal_odds: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OddsHistorySample {
    pub market_key: String,
    pub player_id: String,
    pub game_id: String,
    pub bookmaker: String,
    pub american_odds: i32,
    pub decimal_odds: f64,
    pub captured_at: DateTime<Utc>,
}

/// Rows removed by one retention purge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeCounts {
    pub odds_history: u64,
    pub odds: u64,
    pub game_participants: u64,
    pub games: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub teams: i64,
    pub games: i64,
    pub players: i64,
    pub game_participants: i64,
    pub odds: i64,
    pub odds_history: i64,
}

/// Filter for the odds-history series the dashboard charts
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    pub game_id: String,
    pub market_key: String,
    /// Empty means every player in the game
    pub player_ids: Vec<String>,
    pub bookmaker: Option<String>,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn upsert_team(&self, team: &Team) -> Result<()>;

    async fn upsert_game(&self, game: &Game) -> Result<()>;

    /// A `None` team never overwrites a known one
    async fn upsert_player(&self, player: &Player) -> Result<()>;

    async fn upsert_participant(&self, row: &GameParticipant) -> Result<()>;

    /// Upsert a batch of participant rows atomically; returns rows written
    async fn upsert_participants(&self, rows: &[GameParticipant]) -> Result<usize>;

    async fn upsert_quote(&self, quote: &OddsQuote) -> Result<()>;

    async fn insert_history(&self, sample: &OddsHistorySample) -> Result<()>;

    /// Games whose commence time falls on `date` in US-Eastern (the `games_by_local_date` view)
    async fn games_on_local_date(&self, date: NaiveDate) -> Result<Vec<Game>>;

    /// Games commencing in `[start, end)`
    async fn games_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Game>>;

    /// Players whose team matches any spelling, ignoring case
    async fn players_on_team(&self, spellings: &[String]) -> Result<Vec<Player>>;

    async fn player_ids_with_odds(&self, game_id: &str) -> Result<Vec<String>>;

    async fn players_by_ids(&self, player_ids: &[String]) -> Result<Vec<Player>>;

    /// Delete everything dated (US-Eastern) before `today`, in one transaction:
    /// odds_history, odds, game_participants, games
    async fn purge_before(&self, today: NaiveDate) -> Result<PurgeCounts>;

    async fn list_games(&self, game_date: NaiveDate) -> Result<Vec<Game>>;

    async fn list_game_players(&self, game_id: &str) -> Result<Vec<Player>>;

    async fn odds_history(&self, query: &HistoryQuery) -> Result<Vec<OddsHistorySample>>;

    async fn table_counts(&self) -> Result<TableCounts>;
}
