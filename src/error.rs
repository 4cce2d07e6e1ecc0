use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors raised by the provider client, the store and the jobs
#[derive(Error, Debug)]
pub enum IngestError {
    /// The Odds API answered with a non-2xx status
    #[error("Odds API error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("Odds API request failed: {0}")]
    Transport(String),

    #[error("Failed to decode Odds API payload: {0}")]
    Decode(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unauthorized")]
    Auth,

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            IngestError::Auth => StatusCode::UNAUTHORIZED,
            IngestError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for IngestError {
    fn from(e: sqlx::Error) -> Self {
        IngestError::Store(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for IngestError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        IngestError::Store(format!("migration failed: {}", e))
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(e: reqwest::Error) -> Self {
        IngestError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(e: serde_json::Error) -> Self {
        IngestError::Decode(e.to_string())
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "ok": false, "error": self.to_string() }))).into_response()
    }
}
