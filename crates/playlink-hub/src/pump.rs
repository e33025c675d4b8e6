//! The per-connection delivery pump.
//!
//! Every live connection runs one pump, bound to one [`SessionHandle`]
//! and one duplex transport. The transport is abstract: anything that is
//! a [`Sink`] of [`Frame`]s on the write side and a [`Stream`] of
//! `Result<Frame, E>` on the read side. The server plugs in a `WebSocket`;
//! tests plug in in-memory channels.
//!
//! # Tasks
//!
//! The write side runs in the caller's task and multiplexes:
//!
//! - payloads from the session's outbound queue, each written as a text
//!   frame
//! - a keepalive tick, written as a ping
//! - the read watcher's "peer closed" notification
//!
//! Every write carries a deadline; a write that misses it is fatal.
//!
//! The read watcher runs in its own task. Text frames from a player are
//! state updates and fan out to the player's remotes; text frames from a
//! remote are commands and, once validated, go to the player. A close
//! frame, a read error, or the end of the stream ends the pump.
//!
//! # Cleanup
//!
//! However the pump ends (including a panic in the write loop), the
//! `PumpGuard` fires the disconnect handle exactly once and aborts the
//! read watcher, and the keepalive timer is dropped with the loop. The
//! hub's next sweep then removes the session. The pump never touches the
//! registry itself.

use std::fmt::Display;
use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use playlink_types::{Frame, Payload, PlayerCommand, SessionId, SessionKind, Token};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::{HubConfig, MIN_TICK};
use crate::hub::Hub;
use crate::session::{DisconnectHandle, SessionHandle};

/// Pump timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpConfig {
    /// Interval between keepalive pings.
    pub keepalive_interval: Duration,
    /// Deadline for each frame write.
    pub write_timeout: Duration,
}

impl PumpConfig {
    /// Pump timing taken from the hub configuration.
    pub const fn from_hub_config(config: &HubConfig) -> Self {
        Self {
            keepalive_interval: config.keepalive_interval(),
            write_timeout: config.write_timeout(),
        }
    }
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self::from_hub_config(&HubConfig::default())
    }
}

/// Why a pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// The hub closed the outbound queue; a close frame was sent.
    ChannelClosed,
    /// The peer closed the connection or the read side failed.
    PeerClosed,
    /// A frame write returned an error.
    WriteFailed,
    /// A frame write missed its deadline.
    WriteTimeout,
}

impl Display for PumpExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ChannelClosed => "channel closed",
            Self::PeerClosed => "peer closed",
            Self::WriteFailed => "write failed",
            Self::WriteTimeout => "write timeout",
        })
    }
}

/// Runs one connection until it terminates.
#[derive(Debug)]
pub struct ConnectionPump {
    session: SessionHandle,
    hub: Hub,
    config: PumpConfig,
}

impl ConnectionPump {
    /// Bind a pump to a registered session.
    pub const fn new(session: SessionHandle, hub: Hub, config: PumpConfig) -> Self {
        Self {
            session,
            hub,
            config,
        }
    }

    /// Drive the connection until the queue closes, the peer leaves, or a
    /// write fails. `sink` and `stream` are the two halves of the
    /// connection; both are dropped (closing it) before this returns.
    pub async fn run<W, R, E>(self, mut sink: W, stream: R) -> PumpExit
    where
        W: Sink<Frame> + Unpin,
        W::Error: Display,
        R: Stream<Item = Result<Frame, E>> + Unpin + Send + 'static,
        E: Display + Send + 'static,
    {
        let Self {
            session,
            hub,
            config,
        } = self;
        let SessionHandle {
            id,
            token,
            kind,
            mut outbound,
            disconnect,
        } = session;

        debug!(%token, session_id = %id, %kind, "connection pump started");

        let (peer_closed_tx, mut peer_closed) = oneshot::channel();
        let route = InboundRoute {
            id,
            token: token.clone(),
            kind,
            hub,
        };
        let watcher = tokio::spawn(watch_inbound(stream, route, peer_closed_tx));
        let guard = PumpGuard {
            disconnect,
            watcher: watcher.abort_handle(),
        };

        let mut keepalive = tokio::time::interval(config.keepalive_interval.max(MIN_TICK));
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First ping one full interval from now, not immediately.
        keepalive.reset();

        let exit = loop {
            tokio::select! {
                next = outbound.recv() => {
                    let Some(payload) = next else {
                        // Best effort: the queue is gone either way.
                        let _ = write_frame(&mut sink, Frame::Close(None), config.write_timeout).await;
                        break PumpExit::ChannelClosed;
                    };
                    if let Err(exit) = write_frame(&mut sink, Frame::Text(payload), config.write_timeout).await {
                        break exit;
                    }
                }
                _ = keepalive.tick() => {
                    if let Err(exit) = write_frame(&mut sink, Frame::keepalive(), config.write_timeout).await {
                        break exit;
                    }
                }
                _ = &mut peer_closed => break PumpExit::PeerClosed,
            }
        };

        drop(keepalive);
        drop(guard);
        if exit != PumpExit::WriteTimeout {
            let _ = tokio::time::timeout(config.write_timeout, sink.close()).await;
        }

        info!(%token, session_id = %id, %kind, reason = %exit, "connection closed");
        exit
    }
}

/// Fires the disconnect handle and stops the read watcher on every exit
/// path, unwinding included.
struct PumpGuard {
    disconnect: DisconnectHandle,
    watcher: AbortHandle,
}

impl Drop for PumpGuard {
    fn drop(&mut self) {
        self.disconnect.signal();
        self.watcher.abort();
    }
}

async fn write_frame<W>(sink: &mut W, frame: Frame, deadline: Duration) -> Result<(), PumpExit>
where
    W: Sink<Frame> + Unpin,
    W::Error: Display,
{
    match tokio::time::timeout(deadline, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            debug!(error = %e, "frame write failed");
            Err(PumpExit::WriteFailed)
        }
        Err(_elapsed) => Err(PumpExit::WriteTimeout),
    }
}

/// Where inbound text frames go.
struct InboundRoute {
    id: SessionId,
    token: Token,
    kind: SessionKind,
    hub: Hub,
}

impl InboundRoute {
    fn forward(&self, payload: Payload) {
        match self.kind {
            SessionKind::Player => self.hub.send_to_remotes(&self.token, payload),
            SessionKind::Remote => {
                match PlayerCommand::parse(payload.as_bytes()).and_then(|cmd| cmd.to_payload()) {
                    Ok(command) => self.hub.send_to_player(&self.token, command),
                    Err(e) => warn!(
                        token = %self.token,
                        session_id = %self.id,
                        error = %e,
                        "dropping invalid command from remote"
                    ),
                }
            }
        }
    }
}

/// Read side: forward inbound text, report when the peer goes away.
async fn watch_inbound<R, E>(mut stream: R, route: InboundRoute, peer_closed: oneshot::Sender<()>)
where
    R: Stream<Item = Result<Frame, E>> + Unpin,
    E: Display,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Frame::Text(payload)) => route.forward(payload),
            Ok(Frame::Close(close)) => {
                match close {
                    Some(close) if !close.is_expected() => warn!(
                        token = %route.token,
                        session_id = %route.id,
                        code = close.code,
                        reason = %close.reason,
                        "unexpected close from peer"
                    ),
                    _ => debug!(token = %route.token, session_id = %route.id, "peer closed"),
                }
                break;
            }
            Ok(Frame::Binary(_) | Frame::Ping(_) | Frame::Pong(_)) => {}
            Err(e) => {
                warn!(token = %route.token, session_id = %route.id, error = %e, "read failed");
                break;
            }
        }
    }
    let _ = peer_closed.send(());
}
