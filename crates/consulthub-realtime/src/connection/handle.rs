//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use consulthub_auth::Identity;
use consulthub_core::types::{ConnectionId, UserId};

/// A handle to a single WebSocket connection.
///
/// Holds the bounded sender feeding the socket writer plus the identity
/// the connection authenticated as.
#[derive(Debug)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    /// Fixed at connect time.
    pub identity: Identity,
    /// Serialized outbound frames
    sender: mpsc::Sender<String>,
    pub connected_at: DateTime<Utc>,
    alive: AtomicBool,
    /// Cancelled when the server wants the socket closed.
    closed: CancellationToken,
}

impl ConnectionHandle {
    pub fn new(identity: Identity, sender: mpsc::Sender<String>) -> Self {
        Self {
            id: ConnectionId::new(),
            identity,
            sender,
            connected_at: Utc::now(),
            alive: AtomicBool::new(true),
            closed: CancellationToken::new(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }

    /// Queue a serialized frame. Returns false if it was dropped.
    pub fn send(&self, frame: &str) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(frame.to_owned()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Connection send buffer full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Ask the socket task to close this connection.
    pub fn close(&self) {
        self.mark_dead();
        self.closed.cancel();
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub fn closed(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.closed.cancelled()
    }
}
