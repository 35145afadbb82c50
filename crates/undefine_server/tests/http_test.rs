//! Tests for the REST routes.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::TimeDelta;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;

use undefine_game::GameRules;
use undefine_server::{GameRepository, GameService, NewWord, SqliteSessionStore, router};

fn setup_app() -> (NamedTempFile, Router) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();

    let repo = GameRepository::new(db_path).expect("Failed to create repository");
    repo.run_migrations().expect("Migrations failed");
    repo.insert_word(NewWord::new(
        "house".to_string(),
        "A building for people to live in".to_string(),
        Some("Old English hus".to_string()),
        "h".to_string(),
        None,
        5,
        Some("home, dwelling".to_string()),
        "Easy".to_string(),
    ))
    .expect("Insert failed");

    let store = Arc::new(SqliteSessionStore::new(repo.clone()));
    let service = GameService::new(store, repo, GameRules::default(), TimeDelta::hours(24));
    (db_file, router(service))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Valid request");

    let response = app.clone().oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Body read failed")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, value)
}

async fn start(app: &Router) -> String {
    let (status, body) = send(app, "POST", "/api/games", Some(json!({ "username": "ada" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["sessionId"].as_str().expect("Session id").to_string()
}

#[tokio::test]
async fn test_health() {
    let (_db, app) = setup_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_start_game_returns_definition() {
    let (_db, app) = setup_app();
    let (status, body) = send(&app, "POST", "/api/games", Some(json!({ "username": "ada" }))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["definition"], "A building for people to live in");
    assert_eq!(body["revealedHints"], json!([0]));
    assert_eq!(body["maxGuesses"], 6);
}

#[tokio::test]
async fn test_full_game_flow() {
    let (_db, app) = setup_app();
    let id = start(&app).await;

    let (status, hint) = send(
        &app,
        "POST",
        &format!("/api/games/{id}/hints"),
        Some(json!({ "slot": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hint["code"], "F");
    assert_eq!(hint["text"], "H");

    let (status, guess) = send(
        &app,
        "POST",
        &format!("/api/games/{id}/guesses"),
        Some(json!({ "guess": "hodse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(guess["isFuzzy"], true);
    assert_eq!(guess["fuzzyPositions"], json!([2]));
    assert_eq!(guess["remainingGuesses"], 5);
    assert!(guess.get("correctWord").is_none());

    let (status, view) = send(&app, "GET", &format!("/api/games/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(view.get("targetWord").is_none());
    assert_eq!(view["guesses"][0]["outcome"]["kind"], "fuzzy");

    let (_, win) = send(
        &app,
        "POST",
        &format!("/api/games/{id}/guesses"),
        Some(json!({ "guess": "house" })),
    )
    .await;
    assert_eq!(win["isCorrect"], true);
    assert_eq!(win["gameOver"], true);

    let (_, view) = send(&app, "GET", &format!("/api/games/{id}"), None).await;
    assert_eq!(view["targetWord"], "house");
    assert_eq!(view["score"]["guessesUsed"], 2);

    let (status, stats) = send(&app, "GET", "/api/stats/ada", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["gamesPlayed"], 1);
    assert_eq!(stats["winRate"], 100.0);
    assert_eq!(stats["recentGames"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_error_statuses() {
    let (_db, app) = setup_app();
    let id = start(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/games/{id}/guesses"),
        Some(json!({ "guess": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_guess");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/games/{id}/hints"),
        Some(json!({ "slot": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_hint_slot");

    let (status, _) = send(&app, "GET", "/api/games/game-missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/api/stats/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(
        &app,
        "POST",
        &format!("/api/games/{id}/guesses"),
        Some(json!({ "guess": "house" })),
    )
    .await;
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/games/{id}/guesses"),
        Some(json!({ "guess": "house" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "session_closed");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn test_out_of_range_hint_slots() {
    let (_db, app) = setup_app();
    let id = start(&app).await;

    for slot in [-1, 6, 300] {
        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/games/{id}/hints"),
            Some(json!({ "slot": slot })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "slot {slot}");
        assert_eq!(body["error"], "invalid_hint_slot");
        assert!(body["message"].as_str().is_some_and(|m| m.contains(&slot.to_string())));
    }

    let (_, view) = send(&app, "GET", &format!("/api/games/{id}"), None).await;
    assert_eq!(view["clues"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_malformed_body_gets_json_error() {
    let (_db, app) = setup_app();
    let id = start(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/games/{id}/guesses"),
        Some(json!({ "word": "house" })),
    )
    .await;
    assert!(status.is_client_error());
    assert_eq!(body["error"], "invalid_request");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));

    let (status, body) = send(&app, "POST", "/api/games", Some(json!({}))).await;
    assert!(status.is_client_error());
    assert_eq!(body["error"], "invalid_request");
}
