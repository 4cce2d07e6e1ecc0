//! Read-only endpoints for the dashboard.

use super::AppState;
use crate::calendar::local_date;
use crate::error::{IngestError, Result};
use crate::provider::PLAYER_HOME_RUN_MARKET;
use crate::store::{Game, HistoryQuery, OddsHistorySample, Player};
use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GamesParams {
    /// `YYYY-MM-DD`; defaults to today in US-Eastern
    pub date: Option<String>,
}

pub async fn games(State(state): State<AppState>, Query(params): Query<GamesParams>) -> Result<Json<Vec<Game>>> {
    let date = match params.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => parse_date(raw)?,
        None => local_date(Utc::now()),
    };
    Ok(Json(state.ctx.store.list_games(date).await?))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| IngestError::BadRequest(format!("invalid `date` {:?}, expected YYYY-MM-DD", raw)))
}

#[derive(Debug, Deserialize)]
pub struct PlayersParams {
    pub game_id: Option<String>,
}

pub async fn players(State(state): State<AppState>, Query(params): Query<PlayersParams>) -> Result<Json<Vec<Player>>> {
    let game_id = required(params.game_id, "game_id")?;
    Ok(Json(state.ctx.store.list_game_players(&game_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub game_id: Option<String>,
    /// Comma-separated
    pub player_ids: Option<String>,
    pub bookmaker: Option<String>,
    pub market: Option<String>,
}

pub async fn odds_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<OddsHistorySample>>> {
    let game_id = required(params.game_id, "game_id")?;
    let player_ids = params
        .player_ids
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let query = HistoryQuery {
        game_id,
        market_key: params
            .market
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| PLAYER_HOME_RUN_MARKET.to_string()),
        player_ids,
        bookmaker: params.bookmaker.filter(|b| !b.trim().is_empty()),
    };

    Ok(Json(state.ctx.store.odds_history(&query).await?))
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| IngestError::BadRequest(format!("missing required query parameter `{}`", name)))
}
