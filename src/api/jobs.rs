//! `/jobs/*` handlers. Each runs one job to completion per request.

use super::auth::authorize_refresh;
use super::AppState;
use crate::error::Result;
use crate::jobs::refresh::run as run_refresh;
use crate::jobs::{run_job, Job, JobReply, RefreshReport};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct JobParams {
    pub force: Option<String>,
    pub token: Option<String>,
}

impl JobParams {
    fn forced(&self) -> bool {
        self.force
            .as_deref()
            .is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
    }
}

async fn run_endpoint(state: &AppState, job: Job, force: bool) -> Result<Json<JobReply>> {
    let summary = run_job(&state.ctx, job, Utc::now(), force).await?;
    Ok(Json(summary.into()))
}

pub async fn events(State(state): State<AppState>) -> Result<Json<JobReply>> {
    run_endpoint(&state, Job::Events, false).await
}

pub async fn odds(State(state): State<AppState>) -> Result<Json<JobReply>> {
    run_endpoint(&state, Job::Odds, false).await
}

pub async fn participants(State(state): State<AppState>) -> Result<Json<JobReply>> {
    run_endpoint(&state, Job::Participants, false).await
}

pub async fn cleanup(State(state): State<AppState>, Query(params): Query<JobParams>) -> Result<Json<JobReply>> {
    run_endpoint(&state, Job::Cleanup, params.forced()).await
}

/// Runs all four jobs; 200 with per-job results even when some fail
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<JobParams>,
) -> Result<Json<RefreshReport>> {
    authorize_refresh(state.refresh_secret.as_deref(), &headers, params.token.as_deref())?;

    let report = run_refresh(&state.ctx, Utc::now(), params.forced()).await;
    state.health.record_refresh(&report).await;
    Ok(Json(report))
}
