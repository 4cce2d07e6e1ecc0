use super::payload::{RawGameOdds, UpstreamEvent};
use super::{OddsProvider, PLAYER_HOME_RUN_MARKET};
use crate::config::Config;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::info;

type DirectLimiter =
    RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>;

/// The Odds API v4 client
pub struct TheOddsApiClient {
    http_client: reqwest::Client,
    rate_limiter: DirectLimiter,
    api_key: String,
    base_url: String,
    sport_key: String,
}

impl TheOddsApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_minute(per_minute));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| IngestError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            rate_limiter,
            api_key: config.odds_api_key.clone(),
            base_url: config.odds_api_base_url.clone(),
            sport_key: config.sport_key.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/sports/{}/{}", self.base_url, self.sport_key, endpoint);
        let response = self
            .http_client
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if let Some(remaining) = response.headers().get("x-requests-remaining") {
            info!("API requests remaining: {}", remaining.to_str().unwrap_or("?"));
        }

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(IngestError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl OddsProvider for TheOddsApiClient {
    async fn fetch_events(&self) -> Result<Vec<UpstreamEvent>> {
        let events: Vec<UpstreamEvent> = self.get_json("events", &[("dateFormat", "iso")]).await?;
        info!("Fetched {} events from The Odds API", events.len());
        Ok(events)
    }

    async fn fetch_player_home_run_odds(&self) -> Result<Vec<RawGameOdds>> {
        let games: Vec<RawGameOdds> = self
            .get_json(
                "odds",
                &[
                    ("markets", PLAYER_HOME_RUN_MARKET),
                    ("regions", "us"),
                    ("oddsFormat", "american"),
                    ("dateFormat", "iso"),
                ],
            )
            .await?;
        info!("Fetched home-run odds for {} games from The Odds API", games.len());
        Ok(games)
    }
}
