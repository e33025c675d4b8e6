//! The authoritative token-to-session maps.
//!
//! [`Registry`] is plain, synchronous data. It is owned by exactly one
//! task (the hub dispatcher) and is never shared behind a lock, so none of
//! its methods can block and none of them ever waits on a session's
//! queue.

use std::collections::HashMap;

use playlink_types::{Payload, SessionKind, Token};
use tracing::{debug, info, warn};

use crate::error::HubError;
use crate::session::{Delivery, Session, SessionHandle};

/// Counts of live sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct HubStats {
    /// Registered players (one per token).
    pub players: usize,
    /// Registered remotes across all tokens.
    pub remotes: usize,
}

/// What one sweep reclaimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Players removed this sweep.
    pub players_removed: usize,
    /// Remotes removed this sweep.
    pub remotes_removed: usize,
}

impl SweepReport {
    /// Whether the sweep removed anything.
    pub const fn is_empty(&self) -> bool {
        self.players_removed == 0 && self.remotes_removed == 0
    }
}

/// Token-keyed maps of player and remote sessions.
#[derive(Debug, Default)]
pub struct Registry {
    players: HashMap<Token, Session>,
    remotes: HashMap<Token, Vec<Session>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the player for `token`.
    ///
    /// Fails with [`HubError::PlayerExists`] while a live player holds the
    /// token. A player that has already disconnected but not yet been
    /// swept is reclaimed on the spot so its successor can take over.
    pub fn create_player(&mut self, token: Token, buffer: usize) -> Result<SessionHandle, HubError> {
        if let Some(existing) = self.players.get_mut(&token) {
            if !existing.has_disconnected() {
                return Err(HubError::PlayerExists(token));
            }
            if let Some(stale) = self.players.remove(&token) {
                debug!(%token, session_id = %stale.id(), "reclaiming disconnected player");
                stale.close();
            }
        }

        let (session, handle) = Session::open(token.clone(), SessionKind::Player, buffer);
        info!(%token, session_id = %session.id(), "player registered");
        self.players.insert(token, session);
        Ok(handle)
    }

    /// Register a remote for `token`. Always succeeds, whether or not a
    /// player is currently registered.
    pub fn create_remote(&mut self, token: Token, buffer: usize) -> SessionHandle {
        let (session, handle) = Session::open(token.clone(), SessionKind::Remote, buffer);
        info!(%token, session_id = %session.id(), "remote registered");
        self.remotes.entry(token).or_default().push(session);
        handle
    }

    /// Whether a player is registered for `token`.
    pub fn exists(&self, token: &str) -> bool {
        self.players.contains_key(token)
    }

    /// Remove the player for `token`, closing its outbound queue.
    pub fn remove_player(&mut self, token: &str) -> Result<(), HubError> {
        let session = self
            .players
            .remove(token)
            .ok_or_else(|| HubError::PlayerNotFound(Token::from(token)))?;
        info!(%token, session_id = %session.id(), "player removed");
        session.close();
        Ok(())
    }

    /// Route a payload to the player for `token`.
    ///
    /// Returns `false` (and logs) when no player is registered.
    pub fn deliver_to_player(&self, token: &str, payload: Payload) -> bool {
        let Some(session) = self.players.get(token) else {
            warn!(%token, "failed sending to non-existent player");
            return false;
        };
        log_delivery(session, session.deliver(payload));
        true
    }

    /// Route a payload to every remote for `token`. Returns the number of
    /// remotes the payload was queued for.
    pub fn deliver_to_remotes(&self, token: &str, payload: &Payload) -> usize {
        let Some(group) = self.remotes.get(token) else {
            return 0;
        };
        group
            .iter()
            .map(|session| {
                let outcome = session.deliver(Payload::clone(payload));
                log_delivery(session, outcome);
                outcome
            })
            .filter(|outcome| *outcome == Delivery::Queued)
            .count()
    }

    /// Remove every session whose pump has gone away, closing its
    /// outbound queue.
    pub fn sweep(&mut self) -> SweepReport {
        let mut report = SweepReport::default();

        let gone: Vec<Token> = self
            .players
            .iter_mut()
            .filter_map(|(token, session)| session.has_disconnected().then(|| token.clone()))
            .collect();
        for token in gone {
            if let Some(session) = self.players.remove(&token) {
                retire(session);
                report.players_removed = report.players_removed.saturating_add(1);
            }
        }

        for group in self.remotes.values_mut() {
            let (gone, live) = split_disconnected(std::mem::take(group));
            *group = live;
            report.remotes_removed = report.remotes_removed.saturating_add(gone.len());
            gone.into_iter().for_each(retire);
        }
        self.remotes.retain(|_, group| !group.is_empty());

        report
    }

    /// Count live sessions.
    pub fn stats(&self) -> HubStats {
        HubStats {
            players: self.players.len(),
            remotes: self.remotes.values().map(Vec::len).sum(),
        }
    }
}

/// Split a group into (disconnected, live) by rebuilding it rather than
/// deleting in place.
fn split_disconnected(group: Vec<Session>) -> (Vec<Session>, Vec<Session>) {
    group
        .into_iter()
        .fold((Vec::new(), Vec::new()), |(mut gone, mut live), mut session| {
            if session.has_disconnected() {
                gone.push(session);
            } else {
                live.push(session);
            }
            (gone, live)
        })
}

fn retire(session: Session) {
    let lifetime = chrono::Utc::now().signed_duration_since(session.connected_at());
    info!(
        token = %session.token(),
        session_id = %session.id(),
        kind = %session.kind(),
        connected_secs = lifetime.num_seconds(),
        "session disconnected"
    );
    session.close();
}

fn log_delivery(session: &Session, outcome: Delivery) {
    match outcome {
        Delivery::Queued => {}
        Delivery::Dropped => warn!(
            token = %session.token(),
            session_id = %session.id(),
            kind = %session.kind(),
            "outbound queue full, dropping payload"
        ),
        Delivery::Closed => debug!(
            token = %session.token(),
            session_id = %session.id(),
            "session closed, awaiting sweep"
        ),
    }
}
