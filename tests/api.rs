mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use common::{context, events_fixture, odds_fixture, StaticProvider};
use mlb_hr_odds::api::{create_app, AppState, HealthState};
use mlb_hr_odds::jobs::odds;
use mlb_hr_odds::store::MemoryStore;
use serde_json::Value;
use tower::ServiceExt;

fn app_with(provider: StaticProvider, secret: Option<&str>) -> (Router, MemoryStore) {
    let (ctx, store) = context(provider);
    let state = AppState::new(ctx, secret.map(String::from), HealthState::new());
    (create_app(state), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

#[tokio::test]
async fn refresh_requires_token_when_secret_is_set() {
    let (app, _store) = app_with(StaticProvider::default(), Some("s3cret"));

    let (status, body) = get(&app, "/jobs/refresh").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["ok"], false);

    let (status, _) = get(&app, "/jobs/refresh?token=wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_accepts_token_from_header_bearer_or_query() {
    let (app, _store) = app_with(StaticProvider::default(), Some("s3cret"));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/jobs/refresh")
        .header("x-refresh-token", "s3cret")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let request = Request::builder()
        .uri("/jobs/refresh")
        .header("authorization", "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app, "/jobs/refresh?token=s3cret").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn refresh_accepts_query_token_despite_stale_header() {
    let (app, _store) = app_with(StaticProvider::default(), Some("s3cret"));

    let request = Request::builder()
        .uri("/jobs/refresh?token=s3cret")
        .header("x-refresh-token", "stale")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn refresh_is_open_without_a_secret() {
    let (app, _store) = app_with(StaticProvider::default(), None);

    let (status, body) = get(&app, "/jobs/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 4);
    assert!(body["run_id"].is_string());
}

#[tokio::test]
async fn refresh_partial_failure_is_still_200() {
    let (app, store) = app_with(
        StaticProvider {
            events: events_fixture(),
            odds_failure: Some(502),
            ..Default::default()
        },
        None,
    );

    let (status, body) = get(&app, "/jobs/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["path"], "/jobs/events");
    assert_eq!(results[0]["ok"], true);
    assert_eq!(results[0]["body"]["inserted"], 2);
    assert_eq!(results[2]["path"], "/jobs/odds");
    assert_eq!(results[2]["ok"], false);
    assert_eq!(results[2]["status"], 500);
    assert!(results[2].get("body").is_none());

    assert_eq!(store.games().await.len(), 2);

    // Health reflects the failed run
    let (status, health) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["last_refresh_ok"], false);
    assert_eq!(health["consecutive_failures"], 1);
}

#[tokio::test]
async fn job_endpoints_return_summaries() {
    let (app, _store) = app_with(
        StaticProvider {
            events: events_fixture(),
            odds: odds_fixture(),
            ..Default::default()
        },
        None,
    );

    let (status, body) = get(&app, "/jobs/events").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["inserted"], 2);

    let (status, body) = get(&app, "/jobs/odds").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["upserts"], 3);
    assert_eq!(body["snapshots"], 3);
    assert_eq!(body["newPlayers"], 3);

    let (status, body) = get(&app, "/jobs/participants").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn forced_cleanup_runs_outside_the_window() {
    let (app, _store) = app_with(StaticProvider::default(), None);

    let (status, body) = get(&app, "/jobs/cleanup?force=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["forced"], true);
    assert_eq!(body["deleted"]["games"], 0);
}

#[tokio::test]
async fn failing_job_endpoint_returns_500_with_error() {
    let (app, _store) = app_with(
        StaticProvider {
            odds_failure: Some(401),
            ..Default::default()
        },
        None,
    );

    let (status, body) = get(&app, "/jobs/odds").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("401"));
}

#[tokio::test]
async fn query_endpoints_serve_ingested_rows() {
    let (ctx, store) = context(StaticProvider {
        odds: odds_fixture(),
        ..Default::default()
    });
    odds::run(&ctx, common::noon_july_4()).await.unwrap();
    let app = create_app(AppState::new(ctx, None, HealthState::new()));

    let (status, body) = get(&app, "/api/games?date=2024-07-04").await;
    assert_eq!(status, StatusCode::OK);
    let games = body.as_array().unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0]["game_id"], "evt-nyy-bos");

    let (status, body) = get(&app, "/api/games?date=2024-07-05").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = get(&app, "/api/players?game_id=evt-nyy-bos").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["full_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Aaron Judge", "Rafael Devers"]);

    let (status, body) = get(&app, "/api/odds-history?game_id=evt-nyy-bos&player_ids=592450").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) =
        get(&app, "/api/odds-history?game_id=evt-nyy-bos&player_ids=592450,646240&bookmaker=fanduel").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    assert_eq!(store.history().await.len(), 3);
}

#[tokio::test]
async fn query_endpoints_require_game_id() {
    let (app, _store) = app_with(StaticProvider::default(), None);

    let (status, body) = get(&app, "/api/players").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("game_id"));

    let (status, _) = get(&app, "/api/odds-history?game_id=%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_date_is_a_json_bad_request() {
    let (app, _store) = app_with(StaticProvider::default(), None);

    let (status, body) = get(&app, "/api/games?date=07-04-2024").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("date"));

    let (status, body) = get(&app, "/api/games?date=2024-07-04").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn health_reports_table_counts() {
    let (app, _store) = app_with(StaticProvider::default(), None);

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tables"]["games"], 0);
    assert!(body["last_refresh"].is_null());
}
