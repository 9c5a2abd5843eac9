use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use uuid::Uuid;

pub mod events;
pub mod message_types;
pub mod presence;
pub mod router;

/// Unique identifier for one WebSocket session.
///
/// Each connection gets a fresh session id when it registers. Disconnect
/// cleanup is keyed on it, so a stale socket can never evict the session
/// that replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Live session entry with id and outbound channel.
struct Session {
    id: SessionId,
    sender: UnboundedSender<String>,
}

/// Connection registry mapping each user to at most one live session.
///
/// A second connection for the same user silently supersedes the first:
/// the old entry's sender is dropped, which closes the old session's
/// outbound stream and shuts that connection down.
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    // user_id -> live session (at most one per user)
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the user's live session, superseding any previous one.
    ///
    /// Returns a tuple of (session_id, receiver) where:
    /// - session_id: identity of this session, required for cleanup
    /// - receiver: channel the session reads its outbound frames from
    pub async fn register(&self, user_id: Uuid) -> (SessionId, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        let session_id = SessionId::new();

        let mut guard = self.inner.write().await;
        let previous = guard.insert(
            user_id,
            Session {
                id: session_id,
                sender: tx,
            },
        );

        if let Some(previous) = previous {
            tracing::debug!(
                %user_id,
                "session {:?} superseded by {:?}",
                previous.id,
                session_id
            );
        } else {
            tracing::debug!(%user_id, "registered session {:?}", session_id);
        }

        (session_id, rx)
    }

    /// Remove the user's session, but only if it is still the one identified
    /// by `session_id`. The disconnect of an already-superseded socket must
    /// not evict its replacement.
    ///
    /// Returns whether an entry was actually removed.
    pub async fn unregister(&self, user_id: Uuid, session_id: SessionId) -> bool {
        let mut guard = self.inner.write().await;
        match guard.get(&user_id) {
            Some(session) if session.id == session_id => {
                guard.remove(&user_id);
                tracing::debug!(%user_id, "unregistered session {:?}", session_id);
                true
            }
            Some(_) => {
                tracing::debug!(
                    %user_id,
                    "ignoring stale unregister for session {:?}",
                    session_id
                );
                false
            }
            None => false,
        }
    }

    /// Current session id for the user, absent when offline.
    pub async fn lookup(&self, user_id: Uuid) -> Option<SessionId> {
        let guard = self.inner.read().await;
        guard.get(&user_id).map(|session| session.id)
    }

    pub async fn is_online(&self, user_id: Uuid) -> bool {
        self.lookup(user_id).await.is_some()
    }

    /// Send a frame to the user's live session, if any.
    ///
    /// A dead sender (receiver dropped without unregistering) is cleaned up
    /// on the spot. Returns whether the frame was handed to a live channel.
    pub async fn send_to(&self, user_id: Uuid, msg: String) -> bool {
        let mut guard = self.inner.write().await;
        if let Some(session) = guard.get(&user_id) {
            if session.sender.send(msg).is_ok() {
                return true;
            }
            guard.remove(&user_id);
            tracing::debug!(%user_id, "cleaned up dead session during send");
        }
        false
    }

    /// Broadcast a frame to every live session, cleaning up dead senders.
    pub async fn broadcast_all(&self, msg: String) {
        let mut guard = self.inner.write().await;
        let before = guard.len();
        guard.retain(|_, session| session.sender.send(msg.clone()).is_ok());
        let after = guard.len();

        if before != after {
            tracing::debug!(
                "broadcast cleaned up {} dead sessions, {} active",
                before - after,
                after
            );
        }
    }

    pub async fn online_users(&self) -> Vec<Uuid> {
        let guard = self.inner.read().await;
        guard.keys().copied().collect()
    }

    /// Number of live sessions (for metrics).
    pub async fn connection_count(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }
}
