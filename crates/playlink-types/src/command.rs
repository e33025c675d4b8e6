//! Player commands submitted by remotes.
//!
//! A command arrives as a loosely-typed [`CommandRequest`] (any action
//! string) and is validated into a [`PlayerCommand`] before it is allowed
//! anywhere near the hub. Only the actions in [`PlayerAction`] are
//! relayed; everything else is rejected with
//! [`CommandError::UnknownAction`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::frame::Payload;

/// The set of actions a player understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum PlayerAction {
    /// Start or resume playback.
    Play,
    /// Pause playback.
    Pause,
    /// Skip to the next track.
    Next,
    /// Go back to the previous track.
    Prev,
    /// Set the output volume (`value` carries the level).
    SetVolume,
    /// Seek within the current track (`value` carries the position).
    SetPosition,
    /// Replace the play queue (`value` carries the queue description).
    SetQueue,
}

impl PlayerAction {
    /// Every recognized action, in wire order.
    pub const ALL: [Self; 7] = [
        Self::Play,
        Self::Pause,
        Self::Next,
        Self::Prev,
        Self::SetVolume,
        Self::SetPosition,
        Self::SetQueue,
    ];

    /// The wire name of the action.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Next => "next",
            Self::Prev => "prev",
            Self::SetVolume => "setVolume",
            Self::SetPosition => "setPosition",
            Self::SetQueue => "setQueue",
        }
    }

    /// Look up an action by its exact wire name.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == name)
    }
}

/// A command body exactly as submitted, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CommandRequest {
    /// Requested action name.
    pub action: String,
    /// Optional action argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A validated command, ready to be relayed to a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerCommand {
    /// The action to perform.
    pub action: PlayerAction,
    /// Optional action argument, omitted from the wire when absent or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl PlayerCommand {
    /// Parse and validate a raw JSON command body.
    ///
    /// Malformed JSON yields [`CommandError::Malformed`]; well-formed JSON
    /// naming an unrecognized action yields [`CommandError::UnknownAction`].
    pub fn parse(body: &[u8]) -> Result<Self, CommandError> {
        let request: CommandRequest = serde_json::from_slice(body)?;
        Self::try_from(request)
    }

    /// Re-encode the command as the payload delivered to the player.
    pub fn to_payload(&self) -> Result<Payload, CommandError> {
        let json = serde_json::to_string(self)?;
        Ok(Payload::from(json))
    }
}

impl TryFrom<CommandRequest> for PlayerCommand {
    type Error = CommandError;

    fn try_from(request: CommandRequest) -> Result<Self, Self::Error> {
        let action = PlayerAction::from_wire(&request.action)
            .ok_or(CommandError::UnknownAction(request.action))?;
        // An empty value is the same as no value.
        Ok(Self {
            action,
            value: request.value.filter(|value| !value.is_empty()),
        })
    }
}

/// Reasons a submitted command is rejected.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The body is not a JSON object with a string `action`.
    #[error("request payload incorrect: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The action is not one the player understands.
    #[error("unknown action: {0}")]
    UnknownAction(String),
}
