//! MLB Home-Run Odds Service
//!
//! Pulls MLB schedules and player home-run odds from The Odds API into
//! PostgreSQL on a schedule, and serves job triggers and dashboard queries.

use anyhow::{Context, Result};
use chrono::Utc;
use mlb_hr_odds::api::{create_app, AppState, HealthState};
use mlb_hr_odds::jobs::{refresh, JobContext};
use mlb_hr_odds::provider::{OddsProvider, TheOddsApiClient};
use mlb_hr_odds::store::{MemoryStore, PgStore, Store};
use mlb_hr_odds::{scheduler, Config};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

async fn build_store(config: &Config) -> Result<Arc<dyn Store>> {
    if config.uses_memory_store() {
        warn!("Using in-memory store; data will not survive a restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = PgStore::connect_with_retry(&config.database_url, config.db_max_connections, 5)
        .await
        .context("Failed to connect to PostgreSQL")?;
    store.migrate().await.context("Failed to run migrations")?;
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(
                    "mlb_hr_odds=info"
                        .parse::<tracing_subscriber::filter::Directive>()
                        .context("Invalid log directive")?,
                ),
        )
        .init();

    info!("MLB Home-Run Odds Service v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration: {:?}", config);

    let store = build_store(&config).await?;
    let provider: Arc<dyn OddsProvider> = Arc::new(TheOddsApiClient::new(&config)?);
    let ctx = JobContext::new(store, provider);
    let health = HealthState::new();

    if config.run_once {
        info!("Running in one-shot mode (RUN_ONCE=true)");
        let report = refresh::run(&ctx, Utc::now(), false).await;
        info!("{}", serde_json::to_string(&report)?);
        if !report.ok {
            error!("One-shot refresh {} had failures", report.run_id);
            anyhow::bail!("one-shot refresh finished with failed jobs");
        }
        return Ok(());
    }

    if config.refresh_secret.is_none() {
        warn!("REFRESH_SECRET not set; /jobs/refresh is open");
    }

    let app = create_app(AppState::new(ctx.clone(), config.refresh_secret.clone(), health.clone()));
    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    let server = async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {:?}", e);
        }
    };

    let schedule = async {
        if config.scheduler_enabled {
            scheduler::run(ctx, health, Duration::from_secs(config.poll_interval_seconds)).await;
        } else {
            info!("Scheduler disabled; jobs run only when triggered over HTTP");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = server => {}
        _ = schedule => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
        }
    }

    Ok(())
}
