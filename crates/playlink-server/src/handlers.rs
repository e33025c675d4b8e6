//! REST API endpoint handlers for the pairing server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/player/token` | Issue a fresh, unused pairing token |
//! | `POST` | `/api/player/{token}` | Relay a command to the player |
//! | `DELETE` | `/api/player/{token}` | Disconnect the player |
//! | `GET` | `/api/health` | Liveness plus session counts |

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use playlink_hub::HubStats;
use playlink_types::{PlayerCommand, Token, TokenResponse};
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /api/player/token
// ---------------------------------------------------------------------------

/// Issue a token no player currently holds.
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.allocator.allocate(&state.hub).await?;
    Ok(Json(TokenResponse { token }))
}

// ---------------------------------------------------------------------------
// POST /api/player/{token}
// ---------------------------------------------------------------------------

/// Validate a command and relay it to the token's player.
///
/// The player must exist before the body is even looked at. The command
/// is re-encoded from its validated form, so the player only ever sees
/// `action` and (when present) `value`.
pub async fn send_command(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let token = Token::from(token);
    if !state.hub.player_exists(&token).await? {
        return Err(playlink_hub::HubError::PlayerNotFound(token).into());
    }

    let command = PlayerCommand::parse(&body)?;
    let payload = command.to_payload()?;
    debug!(%token, action = command.action.as_str(), "relaying command");
    state.hub.send_to_player(&token, payload);

    Ok(StatusCode::ACCEPTED)
}

// ---------------------------------------------------------------------------
// DELETE /api/player/{token}
// ---------------------------------------------------------------------------

/// Disconnect the token's player. Its remotes stay registered.
pub async fn remove_player(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.hub.remove_player(Token::from(token)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

/// Response body of the health endpoint.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the hub answers.
    pub status: &'static str,
    /// Live session counts, flattened into the body.
    #[serde(flatten)]
    pub stats: HubStats,
}

/// Report liveness and live session counts.
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let stats = state.hub.stats().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        stats,
    }))
}
