//! The Odds API payloads and their canonical form.
//!
//! Raw structs accept whatever the feed sends (`#[serde(default)]`,
//! alternate id fields, ids as strings or numbers). `into_canonical` turns a
//! raw game entry into a `GameOdds` that the jobs can write without guessing.

use super::teams::normalize_team_abbr;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Entry of `/sports/{sport}/events`
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct UpstreamEvent {
    pub id: String,
    pub sport_key: String,
    pub commence_time: Option<DateTime<Utc>>,
    pub home_team: String,
    pub away_team: String,
}

/// Entry of `/sports/{sport}/odds`
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RawGameOdds {
    #[serde(deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub event_id: Option<String>,
    pub commence_time: Option<DateTime<Utc>>,
    pub home_team: String,
    pub away_team: String,
    pub bookmakers: Vec<RawBookmaker>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RawBookmaker {
    pub key: String,
    pub title: String,
    pub last_update: Option<DateTime<Utc>>,
    pub markets: Vec<RawMarket>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RawMarket {
    pub key: String,
    pub last_update: Option<DateTime<Utc>>,
    pub outcomes: Vec<RawOutcome>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RawOutcome {
    pub name: String,
    /// Player props put the player's name here and "Over"/"Yes" in `name`
    pub description: Option<String>,
    pub price: Option<f64>,
    pub point: Option<f64>,
    #[serde(deserialize_with = "string_or_number")]
    pub player_id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub participant_id: Option<String>,
    pub team: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// How a game is identified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKey {
    /// The feed supplied an id (`id` or `event_id`)
    Upstream(String),
    /// No id; derived from the matchup and start time
    Derived {
        away: String,
        home: String,
        commence: DateTime<Utc>,
    },
}

impl EventKey {
    pub fn game_id(&self) -> String {
        match self {
            EventKey::Upstream(id) => id.clone(),
            EventKey::Derived { away, home, commence } => format!(
                "{}@{}:{}",
                away,
                home,
                commence.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRef {
    pub player_id: String,
    pub full_name: String,
    pub team_abbr: Option<String>,
}

/// One priced outcome for one player at one book
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerQuote {
    pub bookmaker: String,
    pub market_key: String,
    pub player: PlayerRef,
    pub american_odds: i32,
}

/// Canonical odds record for one game
#[derive(Debug, Clone)]
pub struct GameOdds {
    pub key: EventKey,
    pub commence_time: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    pub quotes: Vec<PlayerQuote>,
}

impl GameOdds {
    pub fn game_id(&self) -> String {
        self.key.game_id()
    }
}

impl RawGameOdds {
    /// Validate into a `GameOdds`; `None` when the entry cannot identify a game
    pub fn into_canonical(self) -> Option<GameOdds> {
        let Some(commence_time) = self.commence_time else {
            warn!(
                "Skipping odds entry without commence_time ({} @ {})",
                self.away_team, self.home_team
            );
            return None;
        };
        if self.home_team.trim().is_empty() || self.away_team.trim().is_empty() {
            warn!("Skipping odds entry without both teams (commence {})", commence_time);
            return None;
        }

        let home_team = normalize_team_abbr(&self.home_team);
        let away_team = normalize_team_abbr(&self.away_team);

        let key = match self.id.or(self.event_id) {
            Some(id) => EventKey::Upstream(id),
            None => EventKey::Derived {
                away: away_team.clone(),
                home: home_team.clone(),
                commence: commence_time,
            },
        };

        let mut quotes = Vec::new();
        for bookmaker in self.bookmakers {
            for market in bookmaker.markets {
                for outcome in market.outcomes {
                    if let Some(quote) = outcome.into_quote(&bookmaker.key, &market.key) {
                        quotes.push(quote);
                    }
                }
            }
        }

        Some(GameOdds {
            key,
            commence_time,
            home_team,
            away_team,
            quotes,
        })
    }
}

/// Side labels for the "no home run" half of a two-sided prop
const LOSING_SIDES: [&str; 2] = ["under", "no"];

impl RawOutcome {
    /// True when `description` names the player and `name` is the Under/No side
    fn is_losing_side(&self) -> bool {
        let has_player = self.description.as_deref().is_some_and(|d| !d.trim().is_empty());
        has_player && LOSING_SIDES.contains(&self.name.trim().to_lowercase().as_str())
    }

    fn into_quote(self, bookmaker: &str, market_key: &str) -> Option<PlayerQuote> {
        if self.is_losing_side() {
            debug!("Skipping {} side of {:?} at {}", self.name, self.description, bookmaker);
            return None;
        }

        let full_name = self
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(self.name)
            .trim()
            .to_string();
        if full_name.is_empty() {
            return None;
        }

        // Zero is not a valid American price and would divide by zero downstream
        let american_odds = match self.price.map(|p| p.round() as i32) {
            Some(p) if p != 0 => p,
            _ => {
                debug!("Skipping {} outcome for {} without a price", bookmaker, full_name);
                return None;
            }
        };

        let player_id = self
            .player_id
            .or(self.participant_id)
            .unwrap_or_else(|| full_name.clone());

        Some(PlayerQuote {
            bookmaker: bookmaker.to_string(),
            market_key: market_key.to_string(),
            player: PlayerRef {
                player_id,
                full_name,
                team_abbr: self
                    .team
                    .filter(|t| !t.trim().is_empty())
                    .map(|t| normalize_team_abbr(&t)),
            },
            american_odds,
        })
    }
}
