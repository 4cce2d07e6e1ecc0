use crate::error::{IngestError, Result};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use tracing::warn;

pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

fn extract_bearer_token(raw: &str) -> Option<&str> {
    raw.strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .map(str::trim)
}

/// Byte comparison whose running time does not depend on where the inputs differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Check the refresh token when a secret is configured.
///
/// Accepted from `x-refresh-token`, `Authorization: Bearer`, or the `token`
/// query parameter; any one matching is enough. No configured secret means
/// no check.
pub fn authorize_refresh(expected: Option<&str>, headers: &HeaderMap, query_token: Option<&str>) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let candidates = [
        headers
            .get(REFRESH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim),
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token),
        query_token.map(str::trim),
    ];

    // Every supplied source is compared
    let matched = candidates
        .iter()
        .flatten()
        .fold(false, |ok, token| constant_time_eq(token.as_bytes(), expected.as_bytes()) | ok);

    if matched {
        Ok(())
    } else {
        warn!("Rejected refresh request with missing or invalid token");
        Err(IngestError::Auth)
    }
}
