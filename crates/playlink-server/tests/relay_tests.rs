//! End-to-end relay tests over real `WebSocket` connections.
//!
//! Each test binds the router to an ephemeral port and drives it with
//! `tokio-tungstenite` clients playing the player and remote roles.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use playlink_hub::{Hub, HubConfig, RelayConfig};
use playlink_server::router::build_router;
use playlink_server::state::AppState;
use playlink_types::Token;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start() -> (SocketAddr, Arc<AppState>) {
    let config = RelayConfig {
        hub: HubConfig {
            keepalive_interval_ms: 50,
            sweep_interval_ms: 20,
            ..HubConfig::default()
        },
        ..RelayConfig::default()
    };
    let (hub, _task) = Hub::spawn(config.hub.clone());
    let state = Arc::new(AppState::new(hub, &config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = build_router(Arc::clone(&state), None);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, state)
}

async fn connect(addr: SocketAddr, path: &str) -> Client {
    let (client, _response) = connect_async(format!("ws://{addr}{path}")).await.unwrap();
    client
}

/// Next text message, skipping keepalive pings.
async fn next_text(client: &mut Client) -> Option<String> {
    let deadline = Duration::from_secs(2);
    tokio::time::timeout(deadline, async {
        while let Some(message) = client.next().await {
            match message.ok()? {
                Message::Text(text) => return Some(text.as_str().to_owned()),
                Message::Close(_) => return None,
                _ => {}
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

async fn wait_until_gone(state: &AppState, token: &Token) -> bool {
    for _ in 0..100 {
        if !state.hub.player_exists(token).await.unwrap() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn second_player_is_refused() {
    let (addr, _state) = start().await;
    let _first = connect(addr, "/api/player/DUPLICAT/ws").await;

    let result = connect_async(format!("ws://{addr}/api/player/DUPLICAT/ws")).await;
    let status = match result {
        Err(tungstenite::Error::Http(response)) => Some(response.status().as_u16()),
        _ => None,
    };
    assert_eq!(status, Some(409));
}

#[tokio::test]
async fn command_endpoint_reaches_connected_player() {
    let (addr, state) = start().await;
    let token = Token::new("HTTPCMD0");
    let mut player = connect(addr, "/api/player/HTTPCMD0/ws").await;
    assert!(state.hub.player_exists(&token).await.unwrap());

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let body = r#"{"action":"setPosition","value":"42"}"#;
    let request = format!(
        "POST /api/player/HTTPCMD0 HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    tokio::io::AsyncWriteExt::write_all(&mut stream, request.as_bytes())
        .await
        .unwrap();
    let mut response = String::new();
    tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut response)
        .await
        .unwrap();
    assert!(response.starts_with("HTTP/1.1 202"), "{response}");

    assert_eq!(
        next_text(&mut player).await.as_deref(),
        Some(r#"{"action":"setPosition","value":"42"}"#)
    );
}

#[tokio::test]
async fn player_text_fans_out_to_remotes() {
    let (addr, _state) = start().await;
    let mut player = connect(addr, "/api/player/FANOUT00/ws").await;
    let mut first = connect(addr, "/api/remote/FANOUT00/ws").await;
    let mut second = connect(addr, "/api/remote/FANOUT00/ws").await;
    let mut stranger = connect(addr, "/api/remote/OTHER000/ws").await;

    let state_update = r#"{"state":"playing","position":12}"#;
    player.send(Message::text(state_update)).await.unwrap();

    assert_eq!(next_text(&mut first).await.as_deref(), Some(state_update));
    assert_eq!(next_text(&mut second).await.as_deref(), Some(state_update));

    let leaked = tokio::time::timeout(Duration::from_millis(150), next_text(&mut stranger)).await;
    assert!(leaked.is_err() || leaked.unwrap().is_none());
}

#[tokio::test]
async fn remote_commands_are_validated_before_relay() {
    let (addr, _state) = start().await;
    let mut player = connect(addr, "/api/player/REMOTE00/ws").await;
    let mut remote = connect(addr, "/api/remote/REMOTE00/ws").await;

    remote.send(Message::text(r#"{"action":"teleport"}"#)).await.unwrap();
    remote.send(Message::text(r#"{"action":"pause"}"#)).await.unwrap();

    // The invalid command is dropped; the valid one arrives first.
    assert_eq!(
        next_text(&mut player).await.as_deref(),
        Some(r#"{"action":"pause"}"#)
    );
}

#[tokio::test]
async fn player_close_frees_token() {
    let (addr, state) = start().await;
    let token = Token::new("CLOSING0");
    let mut player = connect(addr, "/api/player/CLOSING0/ws").await;
    assert!(state.hub.player_exists(&token).await.unwrap());

    player.close(None).await.unwrap();
    assert!(wait_until_gone(&state, &token).await);

    // The token can be claimed again.
    let _again = connect(addr, "/api/player/CLOSING0/ws").await;
    assert!(state.hub.player_exists(&token).await.unwrap());
}

#[tokio::test]
async fn removed_player_receives_close() {
    let (addr, state) = start().await;
    let mut player = connect(addr, "/api/player/REMOVED0/ws").await;

    state.hub.remove_player(Token::new("REMOVED0")).await.unwrap();

    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(message) = player.next().await {
            match message {
                Ok(Message::Close(_)) | Err(_) => return true,
                Ok(_) => {}
            }
        }
        true
    })
    .await
    .unwrap();
    assert!(closed);
}
