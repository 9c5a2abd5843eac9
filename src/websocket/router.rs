use uuid::Uuid;

use crate::metrics;
use crate::websocket::events::ServerEvent;
use crate::websocket::ConnectionRegistry;

/// Outcome of a single-target emit.
///
/// A miss is not an error: the target is simply offline, and the stored
/// message log remains authoritative. Callers never branch on this; it
/// exists for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    NotConnected,
}

/// Routes typed events to one user's live session.
#[derive(Clone)]
pub struct DeliveryRouter {
    registry: ConnectionRegistry,
}

impl DeliveryRouter {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Serialize the event once and hand it to the target's session, if
    /// any. No retry, no queueing; offline targets catch up from the store
    /// on their next fetch.
    pub async fn notify(&self, target: Uuid, event: &ServerEvent) -> DeliveryOutcome {
        let event_type = event.event_type();
        let payload = match event.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, event = event_type, "failed to serialize event");
                metrics::record_delivery(event_type, "error");
                return DeliveryOutcome::NotConnected;
            }
        };

        if self.registry.send_to(target, payload).await {
            metrics::record_delivery(event_type, "delivered");
            DeliveryOutcome::Delivered
        } else {
            tracing::debug!(%target, event = event_type, "delivery miss, target offline");
            metrics::record_delivery(event_type, "missed");
            DeliveryOutcome::NotConnected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notify_online_target_delivers_frame() {
        let registry = ConnectionRegistry::new();
        let router = DeliveryRouter::new(registry.clone());
        let target = Uuid::new_v4();

        let (_, mut rx) = registry.register(target).await;

        let outcome = router
            .notify(
                target,
                &ServerEvent::MessageRead {
                    user_id: Uuid::new_v4(),
                },
            )
            .await;
        assert_eq!(outcome, DeliveryOutcome::Delivered);

        let frame = rx.recv().await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed["type"], "message.read");
    }

    #[tokio::test]
    async fn test_notify_offline_target_is_a_silent_miss() {
        let registry = ConnectionRegistry::new();
        let router = DeliveryRouter::new(registry);

        let outcome = router
            .notify(
                Uuid::new_v4(),
                &ServerEvent::CallEnded {
                    from: Uuid::new_v4(),
                },
            )
            .await;
        assert_eq!(outcome, DeliveryOutcome::NotConnected);
    }
}
