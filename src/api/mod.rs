//! HTTP surface: job triggers, the refresh orchestrator, dashboard queries and health.

pub mod auth;
pub mod health;
pub mod jobs;
pub mod queries;

pub use health::HealthState;

use crate::jobs::JobContext;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub ctx: JobContext,
    pub refresh_secret: Option<Arc<str>>,
    pub health: HealthState,
}

impl AppState {
    pub fn new(ctx: JobContext, refresh_secret: Option<String>, health: HealthState) -> Self {
        Self {
            ctx,
            refresh_secret: refresh_secret.map(Arc::from),
            health,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let job_routes = Router::new()
        .route("/events", get(jobs::events))
        .route("/odds", get(jobs::odds))
        .route("/participants", get(jobs::participants))
        .route("/cleanup", get(jobs::cleanup))
        .route("/refresh", get(jobs::refresh).post(jobs::refresh));

    let api_routes = Router::new()
        .route("/games", get(queries::games))
        .route("/players", get(queries::players))
        .route("/odds-history", get(queries::odds_history));

    Router::new()
        .nest("/jobs", job_routes)
        .nest("/api", api_routes)
        .route("/health", get(health::health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
