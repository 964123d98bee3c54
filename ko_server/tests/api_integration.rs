//! Integration tests for the HTTP API.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`, backed by
//! an in-memory store.

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use knockout::{TournamentConfig, host::TournamentManager, store::MemoryStore};
use ko_server::api::{AppState, create_router, request_id::REQUEST_ID_HEADER};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

const ADMIN_TOKEN: &str = "organizer-secret-token";

fn create_test_server(admin_token: Option<&str>) -> Router {
    let state = AppState {
        manager: Arc::new(TournamentManager::new(Arc::new(MemoryStore::new()), None)),
        defaults: TournamentConfig {
            shuffle_on_start: false,
            ..TournamentConfig::default()
        },
        admin_token: admin_token.map(Arc::from),
    };
    create_router(state)
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

async fn create_with_players(app: &Router, players: &[i64]) -> i64 {
    let created = send(
        app,
        "POST",
        "/api/v1/tournaments",
        Some(json!({"name": "Test Cup"})),
        None,
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["id"].as_i64().unwrap();

    for (i, player) in players.iter().enumerate() {
        let registered = send(
            app,
            "POST",
            &format!("/api/v1/tournaments/{id}/participants"),
            Some(json!({"user_id": player})),
            None,
        )
        .await;
        assert_eq!(registered.status, StatusCode::CREATED);
        assert_eq!(registered.body["seed"], json!(i + 1));
    }

    id
}

async fn report(app: &Router, id: i64, match_id: &str, reporter: i64, winner: i64) -> TestResponse {
    send(
        app,
        "POST",
        &format!("/api/v1/tournaments/{id}/matches/{match_id}/report"),
        Some(json!({"reporter_id": reporter, "winner_id": winner})),
        None,
    )
    .await
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_server(None);
    let response = send(&app, "GET", "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["tournaments"], 0);
    assert!(response.headers.contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = create_test_server(None);
    let request = Request::builder()
        .uri("/health")
        .header(REQUEST_ID_HEADER, "trace-42")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "trace-42");
}

#[tokio::test]
async fn test_full_tournament_over_http() {
    let app = create_test_server(None);
    let id = create_with_players(&app, &[1, 2, 3, 4]).await;

    let started = send(&app, "POST", &format!("/api/v1/tournaments/{id}/start"), None, None).await;
    assert_eq!(started.status, StatusCode::OK);
    assert_eq!(started.body.as_array().unwrap().len(), 2);
    assert_eq!(started.body[0]["status"], "in_progress");

    let fetched = send(
        &app,
        "GET",
        &format!("/api/v1/tournaments/{id}/matches/r1m2"),
        None,
        None,
    )
    .await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["player1"], 3);
    assert_eq!(fetched.body["player2"], 4);

    let awaiting = report(&app, id, "r1m1", 1, 1).await;
    assert_eq!(awaiting.status, StatusCode::OK);
    assert_eq!(awaiting.body["outcome"], "awaiting_confirmation");

    let finalized = report(&app, id, "r1m1", 2, 1).await;
    assert_eq!(finalized.body["outcome"], "finalized");
    assert_eq!(finalized.body["winner"], 1);

    // Round 1 still open
    let early = send(&app, "POST", &format!("/api/v1/tournaments/{id}/advance"), None, None).await;
    assert_eq!(early.status, StatusCode::CONFLICT);
    assert_eq!(early.body["kind"], "state");

    report(&app, id, "r1m2", 3, 4).await;
    report(&app, id, "r1m2", 4, 4).await;

    let advanced = send(&app, "POST", &format!("/api/v1/tournaments/{id}/advance"), None, None).await;
    assert_eq!(advanced.status, StatusCode::OK);
    assert_eq!(advanced.body["outcome"], "advanced");
    assert_eq!(advanced.body["round"], 2);
    assert_eq!(advanced.body["matches"][0]["player1"], 1);
    assert_eq!(advanced.body["matches"][0]["player2"], 4);

    report(&app, id, "r2m1", 1, 4).await;
    report(&app, id, "r2m1", 4, 4).await;

    let summary = send(&app, "GET", &format!("/api/v1/tournaments/{id}"), None, None).await;
    assert_eq!(summary.body["status"], "completed");
    assert_eq!(summary.body["champion"], 4);

    let standings = send(
        &app,
        "GET",
        &format!("/api/v1/tournaments/{id}/standings"),
        None,
        None,
    )
    .await;
    assert_eq!(standings.body[0]["user_id"], 4);
    assert_eq!(standings.body[0]["status"], "winner");

    let round1 = send(
        &app,
        "GET",
        &format!("/api/v1/tournaments/{id}/matches?round=1"),
        None,
        None,
    )
    .await;
    assert_eq!(round1.body.as_array().unwrap().len(), 2);

    let all = send(&app, "GET", &format!("/api/v1/tournaments/{id}/matches"), None, None).await;
    assert_eq!(all.body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_start_with_explicit_field() {
    let app = create_test_server(None);
    let id = create_with_players(&app, &[]).await;

    let started = send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/start"),
        Some(json!({"participants": [10, 20, 30]})),
        None,
    )
    .await;
    assert_eq!(started.status, StatusCode::OK);
    let matches = started.body.as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[1]["is_bye"], true);
    assert_eq!(matches[1]["winner"], 30);
}

#[tokio::test]
async fn test_dispute_answers_conflict_and_needs_admin() {
    let app = create_test_server(Some(ADMIN_TOKEN));
    let id = create_with_players(&app, &[1, 2]).await;

    let start_path = format!("/api/v1/tournaments/{id}/start");
    let denied = send(&app, "POST", &start_path, None, None).await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);
    assert_eq!(denied.body["kind"], "unauthorized");

    let started = send(&app, "POST", &start_path, None, Some(ADMIN_TOKEN)).await;
    assert_eq!(started.status, StatusCode::OK);

    report(&app, id, "r1m1", 1, 1).await;
    let disputed = report(&app, id, "r1m1", 2, 2).await;
    assert_eq!(disputed.status, StatusCode::CONFLICT);
    assert_eq!(disputed.body["outcome"], "disputed");
    assert_eq!(disputed.body["reports"].as_array().unwrap().len(), 2);

    // Further reports are refused while disputed
    let blocked = report(&app, id, "r1m1", 1, 1).await;
    assert_eq!(blocked.status, StatusCode::CONFLICT);
    assert_eq!(blocked.body["kind"], "state");

    let resolve_path = format!("/api/v1/tournaments/{id}/matches/r1m1/resolve");
    let resolution = json!({"winner_id": 2, "resolver_id": 900});

    let wrong = send(
        &app,
        "POST",
        &resolve_path,
        Some(resolution.clone()),
        Some("not-the-organizer-token"),
    )
    .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let resolved = send(&app, "POST", &resolve_path, Some(resolution), Some(ADMIN_TOKEN)).await;
    assert_eq!(resolved.status, StatusCode::OK);
    assert_eq!(resolved.body["status"], "completed");
    assert_eq!(resolved.body["winner"], 2);
    assert_eq!(resolved.body["admin_resolved"], true);
    assert_eq!(resolved.body["resolved_by"], 900);
    assert!(resolved.body["result_reports"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_error_statuses() {
    let app = create_test_server(None);

    let missing = send(&app, "GET", "/api/v1/tournaments/99", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["kind"], "not_found");

    let id = create_with_players(&app, &[1, 2]).await;

    // Reporting before the bracket exists
    let early = report(&app, id, "r1m1", 1, 1).await;
    assert_eq!(early.status, StatusCode::CONFLICT);

    send(&app, "POST", &format!("/api/v1/tournaments/{id}/start"), None, None).await;

    let unknown_match = send(
        &app,
        "GET",
        &format!("/api/v1/tournaments/{id}/matches/r7m1"),
        None,
        None,
    )
    .await;
    assert_eq!(unknown_match.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown_match.body["kind"], "validation");

    let outsider = report(&app, id, "r1m1", 1, 3).await;
    assert_eq!(outsider.status, StatusCode::BAD_REQUEST);
    assert_eq!(outsider.body["kind"], "validation");

    let blank = send(
        &app,
        "POST",
        "/api/v1/tournaments",
        Some(json!({"name": "  "})),
        None,
    )
    .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_withdraw_and_close() {
    let app = create_test_server(Some(ADMIN_TOKEN));
    let id = create_with_players(&app, &[1, 2, 3]).await;

    let withdrawn = send(
        &app,
        "DELETE",
        &format!("/api/v1/tournaments/{id}/participants/2"),
        None,
        None,
    )
    .await;
    assert_eq!(withdrawn.status, StatusCode::NO_CONTENT);

    let again = send(
        &app,
        "DELETE",
        &format!("/api/v1/tournaments/{id}/participants/2"),
        None,
        None,
    )
    .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let summary = send(&app, "GET", &format!("/api/v1/tournaments/{id}"), None, None).await;
    assert_eq!(summary.body["participant_count"], 2);

    let path = format!("/api/v1/tournaments/{id}");
    let denied = send(&app, "DELETE", &path, None, None).await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);

    let closed = send(&app, "DELETE", &path, None, Some(ADMIN_TOKEN)).await;
    assert_eq!(closed.status, StatusCode::NO_CONTENT);

    let gone = send(&app, "GET", &path, None, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);

    let listed = send(&app, "GET", "/api/v1/tournaments", None, None).await;
    assert!(listed.body.as_array().unwrap().is_empty());
}
