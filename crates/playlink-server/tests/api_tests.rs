//! Integration tests for the pairing API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Player and remote sessions are registered
//! straight through the hub, standing in for upgraded sockets, so the
//! payload each one would receive can be inspected directly.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use playlink_hub::{Hub, HubConfig, RelayConfig, SessionHandle};
use playlink_server::router::build_router;
use playlink_server::state::AppState;
use playlink_types::{Payload, Token};
use serde_json::Value;
use tower::ServiceExt;

fn make_config() -> RelayConfig {
    RelayConfig {
        hub: HubConfig {
            sweep_interval_ms: 20,
            ..HubConfig::default()
        },
        ..RelayConfig::default()
    }
}

fn make_app() -> (Router, Arc<AppState>) {
    let config = make_config();
    let (hub, _task) = Hub::spawn(config.hub.clone());
    let state = Arc::new(AppState::new(hub, &config));
    (build_router(Arc::clone(&state), None), state)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_command(token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(format!("/api/player/{token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn next_payload(session: &mut SessionHandle) -> Option<Payload> {
    tokio::time::timeout(Duration::from_millis(200), session.outbound.recv())
        .await
        .ok()
        .flatten()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn token_endpoint_issues_unused_token() {
    let (app, state) = make_app();

    let response = app.oneshot(get("/api/player/token")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    let token = Token::new(json["token"].as_str().unwrap());
    assert!(token.is_well_formed(8));
    assert!(!state.hub.player_exists(&token).await.unwrap());
}

#[tokio::test]
async fn command_for_unknown_token_is_not_found() {
    let (app, _state) = make_app();

    let response = app
        .oneshot(post_command("NOPLAYER", r#"{"action":"play"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn play_command_reaches_player_only() {
    let (app, state) = make_app();
    let token = Token::new("T2T2T2T2");
    let mut player = state.hub.register_player(token.clone()).await.unwrap();
    let mut remote = state.hub.register_remote(token.clone()).await.unwrap();

    let response = app
        .oneshot(post_command("T2T2T2T2", r#"{"action":"play"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    assert_eq!(next_payload(&mut player).await.as_deref(), Some(r#"{"action":"play"}"#));
    assert!(next_payload(&mut remote).await.is_none());
}

#[tokio::test]
async fn command_is_re_encoded_from_validated_form() {
    let (app, state) = make_app();
    let token = Token::new("REENCODE");
    let mut player = state.hub.register_player(token).await.unwrap();

    let response = app
        .oneshot(post_command(
            "REENCODE",
            r#"{ "value": "55", "action": "setVolume", "extra": true }"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        next_payload(&mut player).await.as_deref(),
        Some(r#"{"action":"setVolume","value":"55"}"#)
    );
}

#[tokio::test]
async fn unknown_action_is_rejected() {
    let (app, state) = make_app();
    let token = Token::new("TELEPORT");
    let mut player = state.hub.register_player(token).await.unwrap();

    let response = app
        .oneshot(post_command("TELEPORT", r#"{"action":"teleport"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "Action incorrect.");
    assert!(next_payload(&mut player).await.is_none());
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let (app, state) = make_app();
    let _player = state.hub.register_player(Token::new("MALFORM0")).await.unwrap();

    let response = app
        .oneshot(post_command("MALFORM0", "{not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "Request payload incorrect.");
}

#[tokio::test]
async fn disconnected_player_stops_accepting_commands() {
    let (app, state) = make_app();
    let token = Token::new("T3T3T3T3");
    let mut player = state.hub.register_player(token.clone()).await.unwrap();

    player.disconnect.signal();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!state.hub.player_exists(&token).await.unwrap());
    let response = app
        .oneshot(post_command("T3T3T3T3", r#"{"action":"pause"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_player() {
    let (app, state) = make_app();
    let token = Token::new("DELETE00");
    let mut player = state.hub.register_player(token.clone()).await.unwrap();

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/player/DELETE00")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(player.outbound.recv().await.is_none());

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/player/DELETE00")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_session_counts() {
    let (app, state) = make_app();
    let _player = state.hub.register_player(Token::new("HEALTH00")).await.unwrap();
    let _r1 = state.hub.register_remote(Token::new("HEALTH00")).await.unwrap();
    let _r2 = state.hub.register_remote(Token::new("WAITING0")).await.unwrap();

    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["players"], 1);
    assert_eq!(json["remotes"], 2);
    assert_eq!(json.as_object().unwrap().len(), 3);
}

#[tokio::test]
async fn stopped_hub_reports_unavailable() {
    let (app, state) = make_app();
    state.hub.shutdown().await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn websocket_route_requires_upgrade() {
    let (app, state) = make_app();

    let response = app.oneshot(get("/api/player/PLAIN000/ws")).await.unwrap();
    assert!(response.status().is_client_error());
    // Rejected before registration, so no session was created.
    assert!(!state.hub.player_exists(&Token::new("PLAIN000")).await.unwrap());
}

#[tokio::test]
async fn static_dir_serves_index_fallback() {
    let dir = std::env::temp_dir().join(format!("playlink-static-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>remote</h1>").unwrap();

    let config = make_config();
    let (hub, _task) = Hub::spawn(config.hub.clone());
    let state = Arc::new(AppState::new(hub, &config));
    let app = build_router(state, Some(&dir));

    let response = app.clone().oneshot(get("/pair/ABC")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.as_ref(), b"<h1>remote</h1>");

    // API routes still win over the fallback.
    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let _ = std::fs::remove_dir_all(&dir);
}
