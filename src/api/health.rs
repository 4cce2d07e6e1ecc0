use super::AppState;
use crate::jobs::RefreshReport;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

/// Outcome of the most recent refreshes
#[derive(Clone, Default)]
pub struct HealthState {
    pub last_refresh_time: Arc<RwLock<Option<DateTime<Utc>>>>,
    pub last_refresh_ok: Arc<RwLock<Option<bool>>>,
    pub consecutive_failures: Arc<RwLock<usize>>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_refresh(&self, report: &RefreshReport) {
        *self.last_refresh_time.write().await = Some(Utc::now());
        *self.last_refresh_ok.write().await = Some(report.ok);
        let mut failures = self.consecutive_failures.write().await;
        if report.ok {
            *failures = 0;
        } else {
            *failures += 1;
        }
    }
}

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let health = &state.health;
    let last_refresh = *health.last_refresh_time.read().await;
    let last_ok = *health.last_refresh_ok.read().await;
    let failures = *health.consecutive_failures.read().await;

    let tables = match state.ctx.store.table_counts().await {
        Ok(counts) => Some(counts),
        Err(e) => {
            warn!("Health check could not count rows: {}", e);
            None
        }
    };

    let status = if failures > 5 || tables.is_none() {
        "degraded"
    } else {
        "ok"
    };

    let http_status = if failures > 10 {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        http_status,
        Json(json!({
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "status": status,
            "last_refresh": last_refresh.map(|t| t.to_rfc3339()),
            "last_refresh_ok": last_ok,
            "consecutive_failures": failures,
            "tables": tables,
        })),
    )
}
