//! Service configuration.
//!
//! Secrets come from environment variables first and fall back to Docker
//! secret files under `/run/secrets`.

use crate::error::{IngestError, Result};
use std::env;

pub const DEFAULT_ODDS_API_BASE_URL: &str = "https://api.the-odds-api.com/v4";
pub const SPORT_KEY: &str = "baseball_mlb";

/// `DATABASE_URL` value that selects the in-process store
pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Clone)]
pub struct Config {
    pub odds_api_key: String,
    pub odds_api_base_url: String,
    pub requests_per_minute: u32,
    pub database_url: String,
    pub db_max_connections: u32,
    pub sport_key: String,
    pub http_port: u16,
    pub poll_interval_seconds: u64,
    /// If true, run one refresh and exit (no scheduler)
    pub run_once: bool,
    pub scheduler_enabled: bool,
    /// Shared secret gating `/jobs/refresh`; `None` leaves it open
    pub refresh_secret: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("odds_api_base_url", &self.odds_api_base_url)
            .field("requests_per_minute", &self.requests_per_minute)
            .field("uses_memory_store", &self.uses_memory_store())
            .field("http_port", &self.http_port)
            .field("poll_interval_seconds", &self.poll_interval_seconds)
            .field("run_once", &self.run_once)
            .field("scheduler_enabled", &self.scheduler_enabled)
            .field("refresh_secret_set", &self.refresh_secret.is_some())
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let odds_api_key = match env::var("THE_ODDS_API_KEY") {
            Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
            Ok(_) => return Err(IngestError::Config("THE_ODDS_API_KEY is set but empty".into())),
            Err(_) => read_secret_file("/run/secrets/odds_api_key", "odds_api_key")?,
        };

        if looks_like_placeholder(&odds_api_key) {
            return Err(IngestError::Config(
                "THE_ODDS_API_KEY appears to be a placeholder value; replace with your real key".into(),
            ));
        }

        let database_url = match env::var("DATABASE_URL") {
            Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
            Ok(_) => return Err(IngestError::Config("DATABASE_URL is set but empty".into())),
            Err(_) => {
                let db_user = env::var("DB_USER").unwrap_or_else(|_| "mlb".to_string());
                let db_name = env::var("DB_NAME").unwrap_or_else(|_| "mlb".to_string());
                let db_host = env::var("DB_HOST").unwrap_or_else(|_| "postgres".to_string());
                let db_port = env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());
                let db_password = read_secret_file("/run/secrets/db_password", "db_password")?;
                format!("postgresql://{}:{}@{}:{}/{}", db_user, db_password, db_host, db_port, db_name)
            }
        };

        let refresh_secret = env::var("REFRESH_SECRET")
            .or_else(|_| env::var("CRON_SECRET"))
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Self {
            odds_api_key,
            odds_api_base_url: env::var("ODDS_API_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_ODDS_API_BASE_URL.to_string()),
            requests_per_minute: parse_env("ODDS_API_REQUESTS_PER_MINUTE", 45),
            database_url,
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10),
            sport_key: SPORT_KEY.to_string(),
            http_port: parse_env("HTTP_PORT", 8083),
            poll_interval_seconds: positive_seconds("POLL_INTERVAL_SECONDS", parse_env("POLL_INTERVAL_SECONDS", 900))?,
            run_once: parse_bool_env("RUN_ONCE", false),
            scheduler_enabled: parse_bool_env("SCHEDULER_ENABLED", true),
            refresh_secret,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }
}

/// Read a secret from a Docker secret file
fn read_secret_file(file_path: &str, secret_name: &str) -> Result<String> {
    std::fs::read_to_string(file_path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            IngestError::Config(format!(
                "{} not set in environment and secret file {} unreadable: {}",
                secret_name, file_path, e
            ))
        })
}

fn looks_like_placeholder(key: &str) -> bool {
    let key_lower = key.trim().to_lowercase();
    key_lower.contains("change_me") || key_lower.contains("your_") || key_lower.starts_with("sample")
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Interval settings must be at least one second
fn positive_seconds(name: &str, value: u64) -> Result<u64> {
    if value == 0 {
        return Err(IngestError::Config(format!("{} must be at least 1 second", name)));
    }
    Ok(value)
}

fn parse_bool_env(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(v) => matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_keys_rejected() {
        assert!(looks_like_placeholder("CHANGE_ME"));
        assert!(looks_like_placeholder("your_api_key"));
        assert!(looks_like_placeholder("sample-key"));
        assert!(!looks_like_placeholder("3f9a1c0d7e6b4a2f"));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        assert!(matches!(
            positive_seconds("POLL_INTERVAL_SECONDS", 0),
            Err(IngestError::Config(msg)) if msg.contains("POLL_INTERVAL_SECONDS")
        ));
        assert_eq!(positive_seconds("POLL_INTERVAL_SECONDS", 1).unwrap(), 1);
        assert_eq!(positive_seconds("POLL_INTERVAL_SECONDS", 900).unwrap(), 900);
    }

    #[test]
    fn test_parse_env_falls_back_on_garbage() {
        assert_eq!(parse_env("MLB_HR_ODDS_TEST_UNSET_PORT", 8083u16), 8083);
    }
}
