//! Stateless relay for call control signals.
//!
//! No call state, no ring timeout, no history. Each signal is forwarded to
//! the counterpart exactly once, with the SDP/candidate payload treated as
//! an opaque blob. An unreachable callee is a silent miss; the caller's UI
//! gives up on its own.

use serde_json::Value;
use uuid::Uuid;

use crate::websocket::events::ServerEvent;
use crate::websocket::router::{DeliveryOutcome, DeliveryRouter};

#[derive(Clone)]
pub struct CallService {
    router: DeliveryRouter,
}

impl CallService {
    pub fn new(router: DeliveryRouter) -> Self {
        Self { router }
    }

    pub async fn offer(
        &self,
        caller: Uuid,
        callee: Uuid,
        caller_name: String,
        signal: Value,
    ) -> DeliveryOutcome {
        self.router
            .notify(
                callee,
                &ServerEvent::CallIncoming {
                    from: caller,
                    name: caller_name,
                    signal,
                },
            )
            .await
    }

    pub async fn answer(&self, caller: Uuid, signal: Value) -> DeliveryOutcome {
        self.router
            .notify(caller, &ServerEvent::CallAccepted { signal })
            .await
    }

    pub async fn reject(&self, rejecter: Uuid, caller: Uuid) -> DeliveryOutcome {
        self.router
            .notify(caller, &ServerEvent::CallRejected { from: rejecter })
            .await
    }

    pub async fn end(&self, ender: Uuid, peer: Uuid) -> DeliveryOutcome {
        self.router
            .notify(peer, &ServerEvent::CallEnded { from: ender })
            .await
    }
}
