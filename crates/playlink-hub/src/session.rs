//! Sessions: the hub's view of one live connection.
//!
//! Opening a session produces two halves:
//!
//! - [`Session`] stays in the registry. It holds the sending side of the
//!   outbound queue and the receiving side of the disconnect signal.
//! - [`SessionHandle`] goes to the connection pump. It holds the
//!   receiving side of the outbound queue and the [`DisconnectHandle`].
//!
//! Neither half owns the network connection. Dropping the [`Session`]
//! closes the outbound queue, which is how the hub tells a pump to stop;
//! firing (or dropping) the [`DisconnectHandle`] is how a pump tells the
//! hub it has gone away.

use chrono::{DateTime, Utc};
use playlink_types::{Payload, SessionId, SessionKind, Token};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

/// Outcome of pushing a payload onto a session's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The payload is queued for the pump.
    Queued,
    /// The queue is full; the payload was dropped for this session only.
    Dropped,
    /// The pump has gone away; the session awaits the next sweep.
    Closed,
}

/// Registry-side half of a session.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    token: Token,
    kind: SessionKind,
    outbound: mpsc::Sender<Payload>,
    disconnect: DisconnectSignal,
    connected_at: DateTime<Utc>,
}

impl Session {
    /// Open a new session with an outbound queue of `buffer` payloads.
    ///
    /// A zero `buffer` is raised to one; tokio channels cannot be empty.
    pub fn open(token: Token, kind: SessionKind, buffer: usize) -> (Self, SessionHandle) {
        let (outbound_tx, outbound_rx) = mpsc::channel(buffer.max(1));
        let (disconnect_tx, disconnect_rx) = oneshot::channel();
        let id = SessionId::new();

        let session = Self {
            id,
            token: token.clone(),
            kind,
            outbound: outbound_tx,
            disconnect: DisconnectSignal {
                rx: disconnect_rx,
                fired: false,
            },
            connected_at: Utc::now(),
        };
        let handle = SessionHandle {
            id,
            token,
            kind,
            outbound: outbound_rx,
            disconnect: DisconnectHandle {
                tx: Some(disconnect_tx),
            },
        };
        (session, handle)
    }

    /// Session identifier.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// The token this session is paired under.
    pub const fn token(&self) -> &Token {
        &self.token
    }

    /// Player or remote.
    pub const fn kind(&self) -> SessionKind {
        self.kind
    }

    /// When the session was registered.
    pub const fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Push a payload without waiting. Never blocks the caller.
    pub fn deliver(&self, payload: Payload) -> Delivery {
        match self.outbound.try_send(payload) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => Delivery::Dropped,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Whether the pump has signalled disconnect or dropped its queue.
    pub fn has_disconnected(&mut self) -> bool {
        self.disconnect.has_fired() || self.outbound.is_closed()
    }

    /// Close the outbound queue, ending the pump's payload stream.
    pub fn close(self) {
        let Self { outbound, .. } = self;
        drop(outbound);
    }
}

/// Pump-side half of a session.
#[derive(Debug)]
pub struct SessionHandle {
    /// Session identifier.
    pub id: SessionId,
    /// The token this session is paired under.
    pub token: Token,
    /// Player or remote.
    pub kind: SessionKind,
    /// Payloads routed to this session, in send order.
    pub outbound: mpsc::Receiver<Payload>,
    /// Fired when the connection goes away.
    pub disconnect: DisconnectHandle,
}

/// One-shot "this connection is gone" signal held by the pump.
///
/// Firing is idempotent. Dropping an unfired handle fires it, so a pump
/// that panics or returns early still reports its disconnect.
#[derive(Debug)]
pub struct DisconnectHandle {
    tx: Option<oneshot::Sender<()>>,
}

impl DisconnectHandle {
    /// Fire the signal. Returns `true` only on the first call.
    pub fn signal(&mut self) -> bool {
        self.tx.take().is_some_and(|tx| {
            // The registry may already be gone; the signal is still spent.
            let _ = tx.send(());
            true
        })
    }

    /// Whether the signal has been fired.
    pub const fn is_signalled(&self) -> bool {
        self.tx.is_none()
    }
}

impl Drop for DisconnectHandle {
    fn drop(&mut self) {
        self.signal();
    }
}

/// Registry-side view of a [`DisconnectHandle`].
#[derive(Debug)]
struct DisconnectSignal {
    rx: oneshot::Receiver<()>,
    fired: bool,
}

impl DisconnectSignal {
    /// Non-blocking check. A dropped handle counts as fired.
    fn has_fired(&mut self) -> bool {
        if !self.fired {
            self.fired = !matches!(self.rx.try_recv(), Err(oneshot::error::TryRecvError::Empty));
        }
        self.fired
    }
}
