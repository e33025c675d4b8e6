//! `WebSocket` handlers for players and remotes.
//!
//! The session is registered with the hub *before* the upgrade, so a
//! second player on a token is refused with an ordinary `409` instead of
//! an upgraded socket that is immediately closed. If the upgrade itself
//! then fails, the unused session handle is dropped, which fires its
//! disconnect signal and lets the hub's sweep reclaim it.
//!
//! Once upgraded, the socket is split and adapted to the pump's
//! transport-agnostic [`Frame`] interface.

use std::sync::Arc;

use axum::extract::ws::{self, Message, Utf8Bytes, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{future, SinkExt, StreamExt};
use playlink_hub::{ConnectionPump, SessionHandle};
use playlink_types::{CloseFrame, Frame, Payload, Token};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// Upgrade to a player connection for `token`.
///
/// # Route
///
/// `GET /api/player/{token}/ws`
pub async fn player_ws(
    ws: WebSocketUpgrade,
    Path(token): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let session = state.hub.register_player(Token::from(token)).await?;
    Ok(upgrade(ws, session, &state))
}

/// Upgrade to a remote connection for `token`. Remotes may connect
/// before their player does.
///
/// # Route
///
/// `GET /api/remote/{token}/ws`
pub async fn remote_ws(
    ws: WebSocketUpgrade,
    Path(token): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let session = state.hub.register_remote(Token::from(token)).await?;
    Ok(upgrade(ws, session, &state))
}

fn upgrade(ws: WebSocketUpgrade, session: SessionHandle, state: &AppState) -> Response {
    let pump = ConnectionPump::new(session, state.hub.clone(), state.pump);
    ws.on_failed_upgrade(|e| warn!(error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| async move {
            let (sink, stream) = split(socket);
            pump.run(sink, stream).await;
        })
}

/// Split a socket into the pump's frame sink and frame stream.
fn split(
    socket: WebSocket,
) -> (
    impl futures::Sink<Frame, Error = axum::Error> + Unpin,
    impl futures::Stream<Item = Result<Frame, axum::Error>> + Unpin + Send + 'static,
) {
    let (sink, stream) = socket.split();
    let sink = sink.with(|frame: Frame| future::ready(Ok::<_, axum::Error>(to_message(frame))));
    let stream = stream.map(|message| message.map(from_message));
    (sink, stream)
}

/// Convert a pump frame into a `WebSocket` message.
pub fn to_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(payload) => Message::Text(Utf8Bytes::from(String::from(&*payload))),
        Frame::Binary(data) => Message::Binary(data.into()),
        Frame::Ping(data) => Message::Ping(data.into()),
        Frame::Pong(data) => Message::Pong(data.into()),
        Frame::Close(close) => Message::Close(close.map(|close| ws::CloseFrame {
            code: close.code,
            reason: Utf8Bytes::from(close.reason),
        })),
    }
}

/// Convert a received `WebSocket` message into a pump frame.
pub fn from_message(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::Text(Payload::from(text.as_str())),
        Message::Binary(data) => Frame::Binary(data.to_vec()),
        Message::Ping(data) => Frame::Ping(data.to_vec()),
        Message::Pong(data) => Frame::Pong(data.to_vec()),
        Message::Close(close) => Frame::Close(close.map(|close| CloseFrame {
            code: close.code,
            reason: close.reason.as_str().to_owned(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frames_keep_payload_bytes() {
        let payload = Payload::from(r#"{"action":"play"}"#);
        let message = to_message(Frame::Text(Payload::clone(&payload)));
        assert_eq!(from_message(message), Frame::Text(payload));
    }

    #[test]
    fn keepalive_becomes_empty_ping() {
        assert!(matches!(to_message(Frame::keepalive()), Message::Ping(ref d) if d.is_empty()));
    }

    #[test]
    fn close_code_survives_conversion() {
        let frame = Frame::Close(Some(CloseFrame {
            code: 4000,
            reason: String::from("bye"),
        }));
        assert_eq!(from_message(to_message(frame.clone())), frame);
        assert_eq!(from_message(to_message(Frame::Close(None))), Frame::Close(None));
    }
}
