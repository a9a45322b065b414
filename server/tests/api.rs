//! Router integration tests using the Router::oneshot pattern.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chessweb_server::{api, SessionStore};
use engine::mock::ScriptedLauncher;
use engine::{OracleError, OracleLauncher, StockfishLauncher};
use serde_json::{json, Value};
use tower::ServiceExt;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn router_with(launcher: impl OracleLauncher + 'static) -> Router {
    let sessions = Arc::new(SessionStore::new(
        Arc::new(launcher),
        Duration::from_millis(300),
    ));
    api::router(sessions)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    (status, body)
}

async fn new_game(app: &Router) -> (String, Value) {
    let (status, body) = send(app, "POST", "/new_game", None).await;
    assert_eq!(status, StatusCode::OK);
    (body["session_id"].as_str().unwrap().to_string(), body)
}

async fn play(app: &Router, session_id: &str, token: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/move",
        Some(json!({ "session_id": session_id, "move": token })),
    )
    .await
}

async fn state(app: &Router, session_id: &str) -> Value {
    let (status, body) = send(app, "GET", &format!("/game/{}", session_id), None).await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn test_new_game_starts_from_initial_position() {
    let app = router_with(ScriptedLauncher::new());
    let (session_id, body) = new_game(&app).await;

    assert!(!session_id.is_empty());
    assert_eq!(body["oracle_available"], true);
    let board = &body["board_state"];
    assert_eq!(board["fen"], START_FEN);
    assert_eq!(board["move_count"], 0);
    assert_eq!(board["turn"], "white");
    assert_eq!(board["game_over"], false);
    assert_eq!(board["difficulty"], "intermediate");
    assert_eq!(board["legal_moves"].as_array().unwrap().len(), 20);
    assert!(board["last_move"].is_null());
    assert!(board["result"].is_null());
}

#[tokio::test]
async fn test_move_gets_oracle_reply() {
    let app = router_with(ScriptedLauncher::new().with_moves(["e7e5"]));
    let (session_id, _) = new_game(&app).await;

    let (status, body) = play(&app, &session_id, "e2e4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["oracle_move"], "e7e5");
    assert_eq!(body["board_state"]["move_history"], json!(["e2e4", "e7e5"]));
    assert_eq!(body["board_state"]["turn"], "white");
    assert_eq!(body["board_state"]["last_move"], "e7e5");

    assert_eq!(state(&app, &session_id).await, body["board_state"]);
}

#[tokio::test]
async fn test_illegal_move_is_rejected() {
    let app = router_with(ScriptedLauncher::new());
    let (session_id, _) = new_game(&app).await;

    for token in ["e2e5", "e7e5", "garbage", "", "e2e4q"] {
        let (status, body) = play(&app, &session_id, token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "token {:?}", token);
        assert_eq!(body, json!({ "error": "Invalid move" }));
    }

    let board = state(&app, &session_id).await;
    assert_eq!(board["move_history"], json!([]));
    assert_eq!(board["fen"], START_FEN);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = router_with(ScriptedLauncher::new());
    let not_found = json!({ "error": "Session not found" });

    let (status, body) = play(&app, "missing", "e2e4").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, not_found);

    let (status, body) = send(&app, "GET", "/game/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, not_found);

    let (status, _) = send(
        &app,
        "POST",
        "/oracle_move",
        Some(json!({ "session_id": "missing" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/difficulty",
        Some(json!({ "session_id": "missing", "difficulty": "advanced" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fools_mate_ends_game() {
    // No oracle: both sides are played by hand
    let app = router_with(StockfishLauncher::unavailable());
    let (session_id, body) = new_game(&app).await;
    assert_eq!(body["oracle_available"], false);

    for token in ["f2f3", "e7e5", "g2g4", "d8h4"] {
        let (status, _) = play(&app, &session_id, token).await;
        assert_eq!(status, StatusCode::OK);
    }

    let board = state(&app, &session_id).await;
    assert_eq!(board["game_over"], true);
    assert_eq!(board["result"], "0-1");
    assert_eq!(board["termination"], "checkmate");
    assert_eq!(board["in_check"], true);
    assert_eq!(board["legal_moves"], json!([]));

    let (status, _) = play(&app, &session_id, "e1f2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(state(&app, &session_id).await, board);
}

#[tokio::test]
async fn test_without_oracle_query_fails_and_game_continues() {
    let app = router_with(ScriptedLauncher::failing(OracleError::Unavailable));
    let (session_id, body) = new_game(&app).await;
    assert_eq!(body["oracle_available"], false);

    let (status, body) = send(
        &app,
        "POST",
        "/oracle_move",
        Some(json!({ "session_id": session_id })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Could not get move" }));

    let (_, body) = play(&app, &session_id, "e2e4").await;
    assert!(body.get("oracle_move").is_none());
    assert_eq!(body["board_state"]["turn"], "black");

    let (status, body) = play(&app, &session_id, "e7e5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["board_state"]["move_history"], json!(["e2e4", "e7e5"]));
}

#[tokio::test]
async fn test_oracle_move_suggests_without_playing() {
    let app = router_with(ScriptedLauncher::new().with_moves(["d2d4"]));
    let (session_id, _) = new_game(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/oracle_move",
        Some(json!({ "session_id": session_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "move": "d2d4" }));
    assert_eq!(state(&app, &session_id).await["move_count"], 0);
}

#[tokio::test]
async fn test_oracle_timeout_leaves_state_unchanged() {
    let launcher = ScriptedLauncher::new()
        .with_moves(["e7e5"])
        .with_delay(Duration::from_secs(5));
    let app = router_with(launcher.clone());
    let (session_id, _) = new_game(&app).await;

    let (status, body) = play(&app, &session_id, "e2e4").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("oracle_move").is_none());
    assert_eq!(body["board_state"]["move_history"], json!(["e2e4"]));
    assert_eq!(body["board_state"]["turn"], "black");
    assert_eq!(launcher.remaining_replies(), 1);
}

#[tokio::test]
async fn test_set_difficulty() {
    let launcher = ScriptedLauncher::new();
    let app = router_with(launcher.clone());
    let (session_id, _) = new_game(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/difficulty",
        Some(json!({ "session_id": session_id, "difficulty": "beginner" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["difficulty"], "beginner");
    assert_eq!(body["oracle_configured"], true);
    assert_eq!(body["board_state"]["difficulty"], "beginner");

    let last = launcher.configured().last().copied().unwrap();
    assert_eq!(last.depth, 8);
    assert_eq!(last.target_elo, Some(1200));
}

#[tokio::test]
async fn test_invalid_difficulty_is_rejected() {
    let app = router_with(ScriptedLauncher::new());
    let (session_id, _) = new_game(&app).await;

    for value in ["expert", "ADVANCED", ""] {
        let (status, body) = send(
            &app,
            "POST",
            "/difficulty",
            Some(json!({ "session_id": session_id, "difficulty": value })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid difficulty" }));
    }
    assert_eq!(state(&app, &session_id).await["difficulty"], "intermediate");
}

#[tokio::test]
async fn test_failed_reconfiguration_keeps_requested_tier() {
    // The requested tier is recorded even if the oracle rejects it
    let launcher = ScriptedLauncher::new()
        .with_configure_error(OracleError::Unreachable("engine exited".into()));
    let app = router_with(launcher);
    let (session_id, _) = new_game(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/difficulty",
        Some(json!({ "session_id": session_id, "difficulty": "advanced" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["oracle_configured"], false);
    assert_eq!(state(&app, &session_id).await["difficulty"], "advanced");
}

#[tokio::test]
async fn test_castling_is_reported_in_two_square_form() {
    let app = router_with(StockfishLauncher::unavailable());
    let (session_id, _) = new_game(&app).await;
    for token in ["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "f8c5"] {
        let (status, _) = play(&app, &session_id, token).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = play(&app, &session_id, "e1h1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["board_state"]["last_move"], "e1g1");
    assert!(body["board_state"]["fen"]
        .as_str()
        .unwrap()
        .starts_with("r1bqk1nr/pppp1ppp/2n5/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQ1RK1 b kq"));
}

#[tokio::test]
async fn test_health_counts_sessions() {
    let app = router_with(ScriptedLauncher::new());
    new_game(&app).await;
    new_game(&app).await;

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "sessions": 2 }));
}

#[tokio::test]
async fn test_malformed_move_payload_is_invalid_move() {
    let app = router_with(ScriptedLauncher::new());
    let (session_id, _) = new_game(&app).await;

    for payload in [
        json!({ "session_id": session_id, "move": null }),
        json!({ "session_id": session_id, "move": 42 }),
        json!({ "session_id": session_id }),
    ] {
        let (status, body) = send(&app, "POST", "/move", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        assert_eq!(body, json!({ "error": "Invalid move" }));
    }
    assert_eq!(state(&app, &session_id).await["move_count"], 0);
}

#[tokio::test]
async fn test_unknown_session_wins_over_malformed_payload() {
    let app = router_with(ScriptedLauncher::new());
    let not_found = json!({ "error": "Session not found" });

    for (uri, payload) in [
        ("/move", json!({ "session_id": "nope" })),
        ("/move", json!({ "move": "e2e4" })),
        ("/difficulty", json!({ "session_id": 7, "difficulty": 3 })),
        ("/oracle_move", json!({})),
    ] {
        let (status, body) = send(&app, "POST", uri, Some(payload)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "uri {}", uri);
        assert_eq!(body, not_found);
    }
}

#[tokio::test]
async fn test_malformed_difficulty_payload_is_invalid_difficulty() {
    let app = router_with(ScriptedLauncher::new());
    let (session_id, _) = new_game(&app).await;

    for payload in [
        json!({ "session_id": session_id, "difficulty": 3 }),
        json!({ "session_id": session_id, "difficulty": null }),
        json!({ "session_id": session_id }),
    ] {
        let (status, body) = send(&app, "POST", "/difficulty", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid difficulty" }));
    }
}

#[tokio::test]
async fn test_non_json_body_is_a_json_error() {
    let app = router_with(ScriptedLauncher::new());
    let request = Request::builder()
        .method("POST")
        .uri("/move")
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "error": "Invalid request body" }));
}

#[tokio::test]
async fn test_fen_omits_uncapturable_en_passant_square() {
    let app = router_with(StockfishLauncher::unavailable());
    let (session_id, _) = new_game(&app).await;

    let (status, body) = play(&app, &session_id, "e2e4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["board_state"]["fen"],
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
    );
}
