//! Upstream odds provider (The Odds API).

mod client;
pub mod payload;
pub mod teams;

pub use client::TheOddsApiClient;
pub use payload::{EventKey, GameOdds, PlayerQuote, PlayerRef, RawGameOdds, UpstreamEvent};
pub use teams::{normalize_team_abbr, team_id_for_abbr};

use crate::error::Result;
use async_trait::async_trait;

pub const PLAYER_HOME_RUN_MARKET: &str = "player_home_run";

/// Only these books are written as quotes or history
pub const ALLOWED_BOOKS: [&str; 2] = ["fanduel", "betmgm"];

#[async_trait]
pub trait OddsProvider: Send + Sync {
    /// Upcoming MLB events
    async fn fetch_events(&self) -> Result<Vec<UpstreamEvent>>;

    /// Player home-run odds for upcoming games, nested bookmaker → market → outcome
    async fn fetch_player_home_run_odds(&self) -> Result<Vec<RawGameOdds>>;
}

pub fn is_allowed_book(key: &str) -> bool {
    ALLOWED_BOOKS.contains(&key)
}

/// Convert American odds to decimal odds.
///
/// Zero is not checked; callers drop unpriced outcomes first.
pub fn american_to_decimal(odds: i32) -> f64 {
    let a = odds as f64;
    if a > 0.0 {
        1.0 + a / 100.0
    } else {
        1.0 + 100.0 / a.abs()
    }
}
