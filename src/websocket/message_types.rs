use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Events a connected client may push over its socket.
///
/// Call signals are opaque: `signal` carries whatever session description
/// or candidate blob the peers exchange, relayed without inspection.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "typing")]
    Typing { receiver_id: Uuid, is_typing: bool },

    #[serde(rename = "call.offer")]
    CallOffer {
        user_to_call: Uuid,
        signal: Value,
        name: String,
    },

    #[serde(rename = "call.answer")]
    CallAnswer { to: Uuid, signal: Value },

    #[serde(rename = "call.reject")]
    CallReject { to: Uuid },

    #[serde(rename = "call.end")]
    CallEnd { to: Uuid },
}
