//! Axum router construction for the pairing API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled so the web remote can be hosted
//! elsewhere.

use std::path::Path;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /api/player/token` -- issue a pairing token
/// - `GET /api/player/{token}/ws` -- player `WebSocket`
/// - `GET /api/remote/{token}/ws` -- remote `WebSocket`
/// - `POST /api/player/{token}` -- relay a command to the player
/// - `DELETE /api/player/{token}` -- disconnect the player
/// - `GET /api/health` -- liveness and session counts
///
/// When `static_dir` is set, every other path is served from it, and
/// paths with no matching file get its `index.html` so client-side
/// routes of the web remote resolve.
pub fn build_router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        // Pairing
        .route("/api/player/token", get(handlers::issue_token))
        // WebSocket
        .route("/api/player/{token}/ws", get(ws::player_ws))
        .route("/api/remote/{token}/ws", get(ws::remote_ws))
        // Commands
        .route(
            "/api/player/{token}",
            axum::routing::post(handlers::send_command).delete(handlers::remove_player),
        )
        .route("/api/health", get(handlers::health));

    let router = match static_dir {
        Some(dir) => {
            let index = ServeFile::new(dir.join("index.html"));
            router.fallback_service(ServeDir::new(dir).fallback(index))
        }
        None => router,
    };

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
