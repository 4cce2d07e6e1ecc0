use super::{
    Game, GameParticipant, HistoryQuery, OddsHistorySample, OddsQuote, Player, PurgeCounts, Store,
    TableCounts, Team,
};
use crate::calendar::LOCAL_TZ_NAME;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, warn};

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect_with_retry(url: &str, max_connections: u32, max_retries: u32) -> Result<Self> {
        let mut attempt = 0;
        loop {
            match PgPoolOptions::new()
                .max_connections(max_connections)
                .acquire_timeout(Duration::from_secs(10))
                .connect(url)
                .await
            {
                Ok(pool) => {
                    info!("Connected to PostgreSQL");
                    return Ok(Self { pool });
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries {
                        return Err(IngestError::Store(format!(
                            "Failed to connect to database after {} attempts: {}",
                            max_retries, e
                        )));
                    }
                    warn!("Database connection attempt {} failed: {}. Retrying...", attempt, e);
                    tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
                }
            }
        }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }
}

/// `games` rows whose commence time is on a US-Eastern day before `$1`
fn stale_games_subquery() -> String {
    format!(
        "SELECT game_id FROM games WHERE (commence_time AT TIME ZONE '{}')::date < $1",
        LOCAL_TZ_NAME
    )
}

const GAME_COLUMNS: &str = "game_id, sport_key, game_date, commence_time, home_team, away_team";

#[async_trait]
impl Store for PgStore {
    async fn upsert_team(&self, team: &Team) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO teams (abbr, team_id)
            VALUES ($1, $2)
            ON CONFLICT (abbr) DO UPDATE SET
                team_id = COALESCE(EXCLUDED.team_id, teams.team_id)
            "#,
        )
        .bind(&team.abbr)
        .bind(team.team_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_game(&self, game: &Game) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO games (game_id, sport_key, game_date, commence_time, home_team, away_team)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (game_id) DO UPDATE SET
                sport_key = EXCLUDED.sport_key,
                game_date = EXCLUDED.game_date,
                commence_time = EXCLUDED.commence_time,
                home_team = EXCLUDED.home_team,
                away_team = EXCLUDED.away_team
            "#,
        )
        .bind(&game.game_id)
        .bind(&game.sport_key)
        .bind(game.game_date)
        .bind(game.commence_time)
        .bind(&game.home_team)
        .bind(&game.away_team)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_player(&self, player: &Player) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO players (player_id, full_name, team_abbr)
            VALUES ($1, $2, $3)
            ON CONFLICT (player_id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                team_abbr = COALESCE(EXCLUDED.team_abbr, players.team_abbr)
            "#,
        )
        .bind(&player.player_id)
        .bind(&player.full_name)
        .bind(&player.team_abbr)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_participant(&self, row: &GameParticipant) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO game_participants (game_id, player_id, team_abbr)
            VALUES ($1, $2, $3)
            ON CONFLICT (game_id, player_id) DO UPDATE SET
                team_abbr = COALESCE(EXCLUDED.team_abbr, game_participants.team_abbr)
            "#,
        )
        .bind(&row.game_id)
        .bind(&row.player_id)
        .bind(&row.team_abbr)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_participants(&self, rows: &[GameParticipant]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO game_participants (game_id, player_id, team_abbr)
                VALUES ($1, $2, $3)
                ON CONFLICT (game_id, player_id) DO UPDATE SET
                    team_abbr = COALESCE(EXCLUDED.team_abbr, game_participants.team_abbr)
                "#,
            )
            .bind(&row.game_id)
            .bind(&row.player_id)
            .bind(&row.team_abbr)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(rows.len())
    }

    async fn upsert_quote(&self, quote: &OddsQuote) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO odds (market_key, player_id, game_id, bookmaker, american_odds, decimal_odds, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (market_key, player_id, game_id, bookmaker) DO UPDATE SET
                american_odds = EXCLUDED.american_odds,
                decimal_odds = EXCLUDED.decimal_odds,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&quote.market_key)
        .bind(&quote.player_id)
        .bind(&quote.game_id)
        .bind(&quote.bookmaker)
        .bind(quote.american_odds)
        .bind(quote.decimal_odds)
        .bind(quote.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_history(&self, sample: &OddsHistorySample) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO odds_history (market_key, player_id, game_id, bookmaker, american_odds, decimal_odds, captured_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&sample.market_key)
        .bind(&sample.player_id)
        .bind(&sample.game_id)
        .bind(&sample.bookmaker)
        .bind(sample.american_odds)
        .bind(sample.decimal_odds)
        .bind(sample.captured_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn games_on_local_date(&self, date: NaiveDate) -> Result<Vec<Game>> {
        let games = sqlx::query_as::<_, Game>(&format!(
            "SELECT {} FROM games_by_local_date WHERE local_date = $1 ORDER BY commence_time",
            GAME_COLUMNS
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(games)
    }

    async fn games_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Game>> {
        let games = sqlx::query_as::<_, Game>(&format!(
            "SELECT {} FROM games WHERE commence_time >= $1 AND commence_time < $2 ORDER BY commence_time",
            GAME_COLUMNS
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(games)
    }

    async fn players_on_team(&self, spellings: &[String]) -> Result<Vec<Player>> {
        let lowered: Vec<String> = spellings.iter().map(|s| s.to_lowercase()).collect();
        let players = sqlx::query_as::<_, Player>(
            "SELECT player_id, full_name, team_abbr FROM players WHERE lower(team_abbr) = ANY($1) ORDER BY player_id",
        )
        .bind(lowered)
        .fetch_all(&self.pool)
        .await?;
        Ok(players)
    }

    async fn player_ids_with_odds(&self, game_id: &str) -> Result<Vec<String>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT player_id FROM odds WHERE game_id = $1 ORDER BY player_id")
                .bind(game_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }

    async fn players_by_ids(&self, player_ids: &[String]) -> Result<Vec<Player>> {
        if player_ids.is_empty() {
            return Ok(Vec::new());
        }
        let players = sqlx::query_as::<_, Player>(
            "SELECT player_id, full_name, team_abbr FROM players WHERE player_id = ANY($1) ORDER BY player_id",
        )
        .bind(player_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;
        Ok(players)
    }

    async fn purge_before(&self, today: NaiveDate) -> Result<PurgeCounts> {
        let stale_games = stale_games_subquery();
        let mut tx = self.pool.begin().await?;

        let odds_history = sqlx::query(&format!(
            "DELETE FROM odds_history WHERE (captured_at AT TIME ZONE '{}')::date < $1 OR game_id IN ({})",
            LOCAL_TZ_NAME, stale_games
        ))
        .bind(today)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let odds = sqlx::query(&format!("DELETE FROM odds WHERE game_id IN ({})", stale_games))
            .bind(today)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let game_participants = sqlx::query(&format!(
            "DELETE FROM game_participants WHERE game_id IN ({})",
            stale_games
        ))
        .bind(today)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let games = sqlx::query(&format!(
            "DELETE FROM games WHERE (commence_time AT TIME ZONE '{}')::date < $1",
            LOCAL_TZ_NAME
        ))
        .bind(today)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        Ok(PurgeCounts {
            odds_history,
            odds,
            game_participants,
            games,
        })
    }

    async fn list_games(&self, game_date: NaiveDate) -> Result<Vec<Game>> {
        let games = sqlx::query_as::<_, Game>(&format!(
            "SELECT {} FROM games WHERE game_date = $1 ORDER BY commence_time, game_id",
            GAME_COLUMNS
        ))
        .bind(game_date)
        .fetch_all(&self.pool)
        .await?;
        Ok(games)
    }

    async fn list_game_players(&self, game_id: &str) -> Result<Vec<Player>> {
        let players = sqlx::query_as::<_, Player>(
            r#"
            SELECT p.player_id, p.full_name, COALESCE(gp.team_abbr, p.team_abbr) AS team_abbr
            FROM game_participants gp
            JOIN players p ON p.player_id = gp.player_id
            WHERE gp.game_id = $1
            ORDER BY p.full_name
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(players)
    }

    async fn odds_history(&self, query: &HistoryQuery) -> Result<Vec<OddsHistorySample>> {
        let samples = sqlx::query_as::<_, OddsHistorySample>(
            r#"
            SELECT market_key, player_id, game_id, bookmaker, american_odds, decimal_odds, captured_at
            FROM odds_history
            WHERE game_id = $1
              AND market_key = $2
              AND (cardinality($3::text[]) = 0 OR player_id = ANY($3))
              AND ($4::text IS NULL OR bookmaker = $4)
            ORDER BY captured_at, player_id, bookmaker
            "#,
        )
        .bind(&query.game_id)
        .bind(&query.market_key)
        .bind(query.player_ids.clone())
        .bind(&query.bookmaker)
        .fetch_all(&self.pool)
        .await?;
        Ok(samples)
    }

    async fn table_counts(&self) -> Result<TableCounts> {
        let (teams, games, players, game_participants, odds, odds_history): (i64, i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM teams),
                    (SELECT COUNT(*) FROM games),
                    (SELECT COUNT(*) FROM players),
                    (SELECT COUNT(*) FROM game_participants),
                    (SELECT COUNT(*) FROM odds),
                    (SELECT COUNT(*) FROM odds_history)
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(TableCounts {
            teams,
            games,
            players,
            game_participants,
            odds,
            odds_history,
        })
    }
}
