use super::{
    Game, GameParticipant, HistoryQuery, OddsHistorySample, OddsQuote, Player, PurgeCounts, Store,
    TableCounts, Team,
};
use crate::calendar::local_date;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

type QuoteKey = (String, String, String, String);

#[derive(Default)]
struct Tables {
    teams: BTreeMap<String, Team>,
    games: BTreeMap<String, Game>,
    players: BTreeMap<String, Player>,
    participants: BTreeMap<(String, String), GameParticipant>,
    quotes: BTreeMap<QuoteKey, OddsQuote>,
    history: Vec<OddsHistorySample>,
}

/// In-process store with the same upsert semantics as the PostgreSQL schema.
///
/// Selected with `DATABASE_URL=memory://`; contents are lost on exit.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn teams(&self) -> Vec<Team> {
        self.inner.read().await.teams.values().cloned().collect()
    }

    pub async fn games(&self) -> Vec<Game> {
        self.inner.read().await.games.values().cloned().collect()
    }

    pub async fn players(&self) -> Vec<Player> {
        self.inner.read().await.players.values().cloned().collect()
    }

    pub async fn participants(&self) -> Vec<GameParticipant> {
        self.inner.read().await.participants.values().cloned().collect()
    }

    pub async fn quotes(&self) -> Vec<OddsQuote> {
        self.inner.read().await.quotes.values().cloned().collect()
    }

    pub async fn history(&self) -> Vec<OddsHistorySample> {
        self.inner.read().await.history.clone()
    }
}

fn merge_participant(tables: &mut Tables, row: &GameParticipant) {
    let key = (row.game_id.clone(), row.player_id.clone());
    match tables.participants.get_mut(&key) {
        Some(existing) => {
            if row.team_abbr.is_some() {
                existing.team_abbr = row.team_abbr.clone();
            }
        }
        None => {
            tables.participants.insert(key, row.clone());
        }
    }
}

fn sorted_by_commence(mut games: Vec<Game>) -> Vec<Game> {
    games.sort_by(|a, b| a.commence_time.cmp(&b.commence_time).then_with(|| a.game_id.cmp(&b.game_id)));
    games
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_team(&self, team: &Team) -> Result<()> {
        let mut tables = self.inner.write().await;
        let entry = tables.teams.entry(team.abbr.clone()).or_insert_with(|| team.clone());
        if team.team_id.is_some() {
            entry.team_id = team.team_id;
        }
        Ok(())
    }

    async fn upsert_game(&self, game: &Game) -> Result<()> {
        let mut tables = self.inner.write().await;
        tables.games.insert(game.game_id.clone(), game.clone());
        Ok(())
    }

    async fn upsert_player(&self, player: &Player) -> Result<()> {
        let mut tables = self.inner.write().await;
        match tables.players.get_mut(&player.player_id) {
            Some(existing) => {
                existing.full_name = player.full_name.clone();
                if player.team_abbr.is_some() {
                    existing.team_abbr = player.team_abbr.clone();
                }
            }
            None => {
                tables.players.insert(player.player_id.clone(), player.clone());
            }
        }
        Ok(())
    }

    async fn upsert_participant(&self, row: &GameParticipant) -> Result<()> {
        let mut tables = self.inner.write().await;
        merge_participant(&mut tables, row);
        Ok(())
    }

    async fn upsert_participants(&self, rows: &[GameParticipant]) -> Result<usize> {
        let mut tables = self.inner.write().await;
        for row in rows {
            merge_participant(&mut tables, row);
        }
        Ok(rows.len())
    }

    async fn upsert_quote(&self, quote: &OddsQuote) -> Result<()> {
        let key = (
            quote.market_key.clone(),
            quote.player_id.clone(),
            quote.game_id.clone(),
            quote.bookmaker.clone(),
        );
        self.inner.write().await.quotes.insert(key, quote.clone());
        Ok(())
    }

    async fn insert_history(&self, sample: &OddsHistorySample) -> Result<()> {
        self.inner.write().await.history.push(sample.clone());
        Ok(())
    }

    async fn games_on_local_date(&self, date: NaiveDate) -> Result<Vec<Game>> {
        let tables = self.inner.read().await;
        let games = tables
            .games
            .values()
            .filter(|g| local_date(g.commence_time) == date)
            .cloned()
            .collect();
        Ok(sorted_by_commence(games))
    }

    async fn games_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Game>> {
        let tables = self.inner.read().await;
        let games = tables
            .games
            .values()
            .filter(|g| g.commence_time >= start && g.commence_time < end)
            .cloned()
            .collect();
        Ok(sorted_by_commence(games))
    }

    async fn players_on_team(&self, spellings: &[String]) -> Result<Vec<Player>> {
        let lowered: HashSet<String> = spellings.iter().map(|s| s.to_lowercase()).collect();
        let tables = self.inner.read().await;
        Ok(tables
            .players
            .values()
            .filter(|p| {
                p.team_abbr
                    .as_ref()
                    .is_some_and(|t| lowered.contains(&t.to_lowercase()))
            })
            .cloned()
            .collect())
    }

    async fn player_ids_with_odds(&self, game_id: &str) -> Result<Vec<String>> {
        let tables = self.inner.read().await;
        let mut ids: Vec<String> = tables
            .quotes
            .values()
            .filter(|q| q.game_id == game_id)
            .map(|q| q.player_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn players_by_ids(&self, player_ids: &[String]) -> Result<Vec<Player>> {
        let tables = self.inner.read().await;
        Ok(player_ids
            .iter()
            .filter_map(|id| tables.players.get(id).cloned())
            .collect())
    }

    async fn purge_before(&self, today: NaiveDate) -> Result<PurgeCounts> {
        // Single write guard for all four deletes
        let mut tables = self.inner.write().await;

        let stale: HashSet<String> = tables
            .games
            .values()
            .filter(|g| local_date(g.commence_time) < today)
            .map(|g| g.game_id.clone())
            .collect();

        let before = tables.history.len();
        tables
            .history
            .retain(|h| local_date(h.captured_at) >= today && !stale.contains(&h.game_id));
        let odds_history = (before - tables.history.len()) as u64;

        let before = tables.quotes.len();
        tables.quotes.retain(|_, q| !stale.contains(&q.game_id));
        let odds = (before - tables.quotes.len()) as u64;

        let before = tables.participants.len();
        tables.participants.retain(|(game_id, _), _| !stale.contains(game_id));
        let game_participants = (before - tables.participants.len()) as u64;

        let before = tables.games.len();
        tables.games.retain(|game_id, _| !stale.contains(game_id));
        let games = (before - tables.games.len()) as u64;

        Ok(PurgeCounts {
            odds_history,
            odds,
            game_participants,
            games,
        })
    }

    async fn list_games(&self, game_date: NaiveDate) -> Result<Vec<Game>> {
        let tables = self.inner.read().await;
        let games = tables
            .games
            .values()
            .filter(|g| g.game_date == game_date)
            .cloned()
            .collect();
        Ok(sorted_by_commence(games))
    }

    async fn list_game_players(&self, game_id: &str) -> Result<Vec<Player>> {
        let tables = self.inner.read().await;
        let mut players: Vec<Player> = tables
            .participants
            .values()
            .filter(|gp| gp.game_id == game_id)
            .filter_map(|gp| {
                tables.players.get(&gp.player_id).map(|p| Player {
                    player_id: p.player_id.clone(),
                    full_name: p.full_name.clone(),
                    team_abbr: gp.team_abbr.clone().or_else(|| p.team_abbr.clone()),
                })
            })
            .collect();
        players.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(players)
    }

    async fn odds_history(&self, query: &HistoryQuery) -> Result<Vec<OddsHistorySample>> {
        let tables = self.inner.read().await;
        let mut samples: Vec<OddsHistorySample> = tables
            .history
            .iter()
            .filter(|h| h.game_id == query.game_id && h.market_key == query.market_key)
            .filter(|h| query.player_ids.is_empty() || query.player_ids.contains(&h.player_id))
            .filter(|h| query.bookmaker.as_ref().map_or(true, |b| &h.bookmaker == b))
            .cloned()
            .collect();
        samples.sort_by(|a, b| {
            a.captured_at
                .cmp(&b.captured_at)
                .then_with(|| a.player_id.cmp(&b.player_id))
                .then_with(|| a.bookmaker.cmp(&b.bookmaker))
        });
        Ok(samples)
    }

    async fn table_counts(&self) -> Result<TableCounts> {
        let tables = self.inner.read().await;
        Ok(TableCounts {
            teams: tables.teams.len() as i64,
            games: tables.games.len() as i64,
            players: tables.players.len() as i64,
            game_participants: tables.participants.len() as i64,
            odds: tables.quotes.len() as i64,
            odds_history: tables.history.len() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn player(id: &str, team: Option<&str>) -> Player {
        Player {
            player_id: id.into(),
            full_name: id.into(),
            team_abbr: team.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_player_upsert_keeps_known_team() {
        let store = MemoryStore::new();
        store.upsert_player(&player("judge", Some("NYY"))).await.unwrap();
        store.upsert_player(&player("judge", None)).await.unwrap();
        assert_eq!(store.players().await[0].team_abbr.as_deref(), Some("NYY"));

        store.upsert_player(&player("judge", Some("SF"))).await.unwrap();
        assert_eq!(store.players().await[0].team_abbr.as_deref(), Some("SF"));
    }

    #[tokio::test]
    async fn test_players_on_team_ignores_case() {
        let store = MemoryStore::new();
        store.upsert_player(&player("a", Some("nyy"))).await.unwrap();
        store.upsert_player(&player("b", Some("BOS"))).await.unwrap();
        store.upsert_player(&player("c", None)).await.unwrap();

        let found = store.players_on_team(&["NYY".to_string()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].player_id, "a");
    }

    #[tokio::test]
    async fn test_games_between_is_half_open() {
        let store = MemoryStore::new();
        let start = Utc.with_ymd_and_hms(2024, 7, 4, 12, 0, 0).unwrap();
        for (id, hour) in [("early", 12), ("late", 18)] {
            let commence = Utc.with_ymd_and_hms(2024, 7, 4, hour, 0, 0).unwrap();
            store
                .upsert_game(&Game {
                    game_id: id.into(),
                    sport_key: "baseball_mlb".into(),
                    game_date: local_date(commence),
                    commence_time: commence,
                    home_team: "NYY".into(),
                    away_team: "BOS".into(),
                })
                .await
                .unwrap();
        }
        let end = Utc.with_ymd_and_hms(2024, 7, 4, 18, 0, 0).unwrap();
        let games = store.games_between(start, end).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].game_id, "early");
    }
}
