use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use crate::metrics;
use crate::store::UserDirectory;
use crate::websocket::events::ServerEvent;
use crate::websocket::{ConnectionRegistry, SessionId};

/// Presence is derived state: the set of users currently in the connection
/// registry. Every successful connect or disconnect pushes the complete
/// online-user snapshot to every session, never a diff, so one missed
/// update is healed by the next.
#[derive(Clone)]
pub struct PresenceBroadcaster {
    registry: ConnectionRegistry,
    directory: Arc<dyn UserDirectory>,
}

impl PresenceBroadcaster {
    pub fn new(registry: ConnectionRegistry, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            registry,
            directory,
        }
    }

    /// Register the user's session and announce the new snapshot. The
    /// snapshot also reaches the user who just connected.
    pub async fn connect(&self, user_id: Uuid) -> (SessionId, UnboundedReceiver<String>) {
        let (session_id, rx) = self.registry.register(user_id).await;

        if let Err(e) = self.directory.touch_last_seen(user_id, Utc::now()).await {
            tracing::warn!(error = %e, %user_id, "failed to update last_seen on connect");
        }

        self.broadcast_snapshot().await;
        metrics::set_ws_connections(self.registry.connection_count().await as i64);

        (session_id, rx)
    }

    /// Unregister and announce, but only when the session is still the
    /// user's current one. The disconnect of a superseded socket changes
    /// nothing: its owner is still online through the replacement.
    pub async fn disconnect(&self, user_id: Uuid, session_id: SessionId) {
        if !self.registry.unregister(user_id, session_id).await {
            return;
        }

        if let Err(e) = self.directory.touch_last_seen(user_id, Utc::now()).await {
            tracing::warn!(error = %e, %user_id, "failed to update last_seen on disconnect");
        }

        self.broadcast_snapshot().await;
        metrics::set_ws_connections(self.registry.connection_count().await as i64);
    }

    /// Push the full online-user list to every session. Fire-and-forget:
    /// nobody acknowledges snapshots, and `online_users` serves on-demand
    /// reconciliation for clients that suspect they missed one.
    pub async fn broadcast_snapshot(&self) {
        let users = self.registry.online_users().await;
        let event = ServerEvent::PresenceOnline { users };

        match event.to_payload() {
            Ok(payload) => {
                self.registry.broadcast_all(payload).await;
                metrics::record_presence_broadcast();
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize presence snapshot");
            }
        }
    }

    pub async fn online_users(&self) -> Vec<Uuid> {
        self.registry.online_users().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;
    use crate::store::memory::MemoryUserDirectory;

    fn broadcaster() -> (PresenceBroadcaster, ConnectionRegistry, Arc<MemoryUserDirectory>) {
        let registry = ConnectionRegistry::new();
        let directory = Arc::new(MemoryUserDirectory::new());
        let presence = PresenceBroadcaster::new(registry.clone(), directory.clone());
        (presence, registry, directory)
    }

    fn snapshot_users(frame: &str) -> Vec<Uuid> {
        let parsed: serde_json::Value = serde_json::from_str(frame).unwrap();
        assert_eq!(parsed["type"], "presence.online");
        parsed["users"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u.as_str().unwrap().parse().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_connect_broadcasts_full_snapshot_to_everyone() {
        let (presence, _, _) = broadcaster();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let (_, mut rx_alice) = presence.connect(alice).await;
        // Alice sees herself in the first snapshot.
        let users = snapshot_users(&rx_alice.recv().await.unwrap());
        assert_eq!(users, vec![alice]);

        let (_, mut rx_bob) = presence.connect(bob).await;

        // Both now see both.
        let users = snapshot_users(&rx_alice.recv().await.unwrap());
        assert_eq!(users.len(), 2);
        let users = snapshot_users(&rx_bob.recv().await.unwrap());
        assert!(users.contains(&alice) && users.contains(&bob));
    }

    #[tokio::test]
    async fn test_disconnect_removes_user_from_snapshot() {
        let (presence, _, _) = broadcaster();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let (_, mut rx_alice) = presence.connect(alice).await;
        let (bob_sid, _rx_bob) = presence.connect(bob).await;

        // Drain Alice's two snapshots.
        rx_alice.recv().await.unwrap();
        rx_alice.recv().await.unwrap();

        presence.disconnect(bob, bob_sid).await;

        let users = snapshot_users(&rx_alice.recv().await.unwrap());
        assert_eq!(users, vec![alice]);
    }

    #[tokio::test]
    async fn test_stale_disconnect_broadcasts_nothing() {
        let (presence, _, _) = broadcaster();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let (_, mut rx_alice) = presence.connect(alice).await;
        let (old_sid, _old_rx) = presence.connect(bob).await;
        // Bob reconnects; the old session is superseded.
        let (_new_sid, _new_rx) = presence.connect(bob).await;

        // Drain the three connect snapshots.
        for _ in 0..3 {
            rx_alice.recv().await.unwrap();
        }

        // The old socket's disconnect arrives late. Bob stays online and
        // no snapshot goes out.
        presence.disconnect(bob, old_sid).await;
        assert!(rx_alice.try_recv().is_err());
        assert!(presence.online_users().await.contains(&bob));
    }

    #[tokio::test]
    async fn test_connect_touches_last_seen() {
        let (presence, _, directory) = broadcaster();
        let alice = Uuid::new_v4();

        let stale = Utc::now() - chrono::Duration::hours(2);
        directory
            .upsert(UserProfile {
                id: alice,
                display_name: "Alice".into(),
                avatar_url: None,
                last_seen_at: stale,
            })
            .await
            .unwrap();

        let (_, _rx) = presence.connect(alice).await;

        let profile = directory.find(alice).await.unwrap().unwrap();
        assert!(profile.last_seen_at > stale);
    }
}
