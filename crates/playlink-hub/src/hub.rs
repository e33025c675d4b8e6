//! The hub: registry owner and broadcast dispatcher.
//!
//! One long-lived task owns the [`Registry`] and is reached only through
//! message passing. It selects over four sources:
//!
//! 1. control requests (register, remove, exists, stats), each answered
//!    on its own `oneshot`
//! 2. to-player broadcasts
//! 3. to-remotes broadcasts
//! 4. the sweep tick, which reclaims disconnected sessions
//!
//! Delivery into a session's outbound queue is a non-blocking
//! `try_send`, so a stalled pump loses payloads instead of stalling the
//! owner task, every other session, or the sweep.
//!
//! [`Hub`] is the cheap, cloneable handle every other task uses. The
//! owner task exits on [`Hub::shutdown`] or once the last handle is
//! dropped; either way it drops every session, which closes every
//! outbound queue and lets each pump send its close frame.

use playlink_types::{Payload, Token};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::{HubConfig, MIN_TICK};
use crate::error::HubError;
use crate::registry::{HubStats, Registry};
use crate::session::SessionHandle;

/// A payload routed to the sessions paired under `target`.
#[derive(Debug, Clone)]
pub struct BroadcastMessage {
    /// Destination token.
    pub target: Token,
    /// Opaque, already-encoded payload.
    pub payload: Payload,
}

/// Requests answered by the owner task.
#[derive(Debug)]
enum Control {
    RegisterPlayer {
        token: Token,
        reply: oneshot::Sender<Result<SessionHandle, HubError>>,
    },
    RegisterRemote {
        token: Token,
        reply: oneshot::Sender<SessionHandle>,
    },
    RemovePlayer {
        token: Token,
        reply: oneshot::Sender<Result<(), HubError>>,
    },
    PlayerExists {
        token: Token,
        reply: oneshot::Sender<bool>,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
    Shutdown,
}

/// Handle to the running hub.
#[derive(Debug, Clone)]
pub struct Hub {
    control: mpsc::Sender<Control>,
    to_player: mpsc::Sender<BroadcastMessage>,
    to_remotes: mpsc::Sender<BroadcastMessage>,
}

impl Hub {
    /// Start the owner task.
    ///
    /// Returns the handle and the task's [`JoinHandle`]; the task ends once
    /// every clone of the handle has been dropped.
    pub fn spawn(config: HubConfig) -> (Self, JoinHandle<()>) {
        let capacity = config.broadcast_buffer.max(1);
        let (control_tx, control_rx) = mpsc::channel(capacity);
        let (player_tx, player_rx) = mpsc::channel(capacity);
        let (remotes_tx, remotes_rx) = mpsc::channel(capacity);

        let dispatcher = Dispatcher {
            registry: Registry::new(),
            config,
            control: control_rx,
            to_player: player_rx,
            to_remotes: remotes_rx,
        };
        let task = tokio::spawn(dispatcher.run());

        let hub = Self {
            control: control_tx,
            to_player: player_tx,
            to_remotes: remotes_tx,
        };
        (hub, task)
    }

    /// Register the player for `token`.
    ///
    /// Fails with [`HubError::PlayerExists`] if a live player already holds
    /// the token.
    pub async fn register_player(&self, token: Token) -> Result<SessionHandle, HubError> {
        self.request(|reply| Control::RegisterPlayer { token, reply })
            .await?
    }

    /// Register a remote for `token`.
    pub async fn register_remote(&self, token: Token) -> Result<SessionHandle, HubError> {
        self.request(|reply| Control::RegisterRemote { token, reply })
            .await
    }

    /// Remove the player for `token`, ending its pump.
    pub async fn remove_player(&self, token: Token) -> Result<(), HubError> {
        self.request(|reply| Control::RemovePlayer { token, reply })
            .await?
    }

    /// Whether a player is currently registered for `token`.
    pub async fn player_exists(&self, token: &Token) -> Result<bool, HubError> {
        let token = token.clone();
        self.request(|reply| Control::PlayerExists { token, reply })
            .await
    }

    /// Count live sessions.
    pub async fn stats(&self) -> Result<HubStats, HubError> {
        self.request(|reply| Control::Stats { reply }).await
    }

    /// Stop the owner task. Every session's queue is closed, so every pump
    /// sends a close frame and exits. Later requests fail with
    /// [`HubError::Unavailable`].
    pub async fn shutdown(&self) {
        if self.control.send(Control::Shutdown).await.is_err() {
            debug!("hub already stopped");
        }
    }

    /// Queue a payload for the player of `token`. Fire-and-forget: never
    /// waits, never fails. A missing player is logged by the owner task.
    pub fn send_to_player(&self, token: &Token, payload: Payload) {
        enqueue(&self.to_player, token, payload, "player");
    }

    /// Queue a payload for every remote of `token`. Fire-and-forget.
    pub fn send_to_remotes(&self, token: &Token, payload: Payload) {
        enqueue(&self.to_remotes, token, payload, "remotes");
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Control,
    ) -> Result<T, HubError> {
        let (reply, response) = oneshot::channel();
        self.control
            .send(build(reply))
            .await
            .map_err(|_closed| HubError::Unavailable)?;
        response.await.map_err(|_closed| HubError::Unavailable)
    }
}

fn enqueue(
    queue: &mpsc::Sender<BroadcastMessage>,
    token: &Token,
    payload: Payload,
    target: &'static str,
) {
    let message = BroadcastMessage {
        target: token.clone(),
        payload,
    };
    match queue.try_send(message) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            warn!(%token, target, "hub broadcast queue full, dropping payload");
        }
        Err(TrySendError::Closed(_)) => {
            warn!(%token, target, "hub stopped, dropping payload");
        }
    }
}

/// The owner task's state.
struct Dispatcher {
    registry: Registry,
    config: HubConfig,
    control: mpsc::Receiver<Control>,
    to_player: mpsc::Receiver<BroadcastMessage>,
    to_remotes: mpsc::Receiver<BroadcastMessage>,
}

impl Dispatcher {
    async fn run(mut self) {
        let mut sweep = tokio::time::interval(self.config.sweep_interval().max(MIN_TICK));
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            sweep_interval_ms = self.config.sweep_interval_ms,
            session_buffer = self.config.session_buffer,
            "hub started"
        );

        loop {
            tokio::select! {
                request = self.control.recv() => {
                    match request {
                        Some(Control::Shutdown) | None => break,
                        Some(request) => self.handle(request),
                    }
                }
                Some(message) = self.to_player.recv() => {
                    self.registry.deliver_to_player(message.target.as_str(), message.payload);
                }
                Some(message) = self.to_remotes.recv() => {
                    let delivered = self
                        .registry
                        .deliver_to_remotes(message.target.as_str(), &message.payload);
                    debug!(token = %message.target, delivered, "broadcast to remotes");
                }
                _ = sweep.tick() => {
                    let report = self.registry.sweep();
                    if !report.is_empty() {
                        debug!(
                            players_removed = report.players_removed,
                            remotes_removed = report.remotes_removed,
                            "sweep reclaimed sessions"
                        );
                    }
                }
            }
        }

        let stats = self.registry.stats();
        info!(
            players = stats.players,
            remotes = stats.remotes,
            "hub stopped, closing remaining sessions"
        );
    }

    fn handle(&mut self, request: Control) {
        let buffer = self.config.session_buffer;
        // A caller that gave up on its reply drops the handle it would have
        // received; the dropped handle fires its disconnect and the next
        // sweep reclaims the session.
        match request {
            Control::RegisterPlayer { token, reply } => {
                let _ = reply.send(self.registry.create_player(token, buffer));
            }
            Control::RegisterRemote { token, reply } => {
                let _ = reply.send(self.registry.create_remote(token, buffer));
            }
            Control::RemovePlayer { token, reply } => {
                let _ = reply.send(self.registry.remove_player(token.as_str()));
            }
            Control::PlayerExists { token, reply } => {
                let _ = reply.send(self.registry.exists(token.as_str()));
            }
            Control::Stats { reply } => {
                let _ = reply.send(self.registry.stats());
            }
            Control::Shutdown => {}
        }
    }
}
