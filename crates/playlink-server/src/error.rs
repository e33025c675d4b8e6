//! Error types for the pairing API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use playlink_hub::HubError;
use playlink_types::CommandError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A live player already holds the token.
    #[error("conflict: {0}")]
    Conflict(String),

    /// No player is registered for the token.
    #[error("not found: {0}")]
    NotFound(String),

    /// The command body is malformed or names an unknown action.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Token allocation ran out of attempts.
    #[error("exhausted: {0}")]
    Exhausted(String),

    /// The hub has stopped.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl From<HubError> for ApiError {
    fn from(err: HubError) -> Self {
        match err {
            HubError::PlayerExists(_) => Self::Conflict(err.to_string()),
            HubError::PlayerNotFound(_) => Self::NotFound(err.to_string()),
            HubError::TokensExhausted(_) => Self::Exhausted(String::from("Failed to generate token.")),
            HubError::Unavailable => Self::Unavailable(err.to_string()),
        }
    }
}

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Malformed(_) => Self::Validation(String::from("Request payload incorrect.")),
            CommandError::UnknownAction(_) => Self::Validation(String::from("Action incorrect.")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Exhausted(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
