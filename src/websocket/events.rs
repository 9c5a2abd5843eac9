//! Server-to-client event vocabulary.
//!
//! All events follow the "object.action" naming convention and share one
//! wire shape: the variant's fields plus a `type` tag and a `timestamp`,
//! flat at the top level. Serialization is centralized in `to_payload` so
//! handlers never build event JSON by hand.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{MessageView, Reaction};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Full online-user snapshot, pushed to everyone whenever any user
    /// connects or disconnects. Always the complete list, never a diff, so
    /// one missed update heals on the next.
    #[serde(rename = "presence.online")]
    PresenceOnline { users: Vec<Uuid> },

    #[serde(rename = "typing.update")]
    TypingUpdate { sender_id: Uuid, is_typing: bool },

    #[serde(rename = "message.new")]
    MessageNew { message: MessageView },

    /// The peer has fetched the conversation; their copy of our messages is
    /// now at least `delivered`.
    #[serde(rename = "message.delivered")]
    MessageDelivered { user_id: Uuid },

    #[serde(rename = "message.read")]
    MessageRead { user_id: Uuid },

    #[serde(rename = "message.edited")]
    MessageEdited { message: MessageView },

    #[serde(rename = "message.deleted")]
    MessageDeleted {
        message_id: Uuid,
        delete_for_everyone: bool,
    },

    /// Carries the full reaction list so clients replace local state
    /// instead of merging.
    #[serde(rename = "reaction.added")]
    ReactionAdded {
        message_id: Uuid,
        reactions: Vec<Reaction>,
    },

    #[serde(rename = "call.incoming")]
    CallIncoming {
        from: Uuid,
        name: String,
        signal: Value,
    },

    #[serde(rename = "call.accepted")]
    CallAccepted { signal: Value },

    #[serde(rename = "call.rejected")]
    CallRejected { from: Uuid },

    #[serde(rename = "call.ended")]
    CallEnded { from: Uuid },
}

impl ServerEvent {
    /// Get event type as string (e.g., "message.new")
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PresenceOnline { .. } => "presence.online",
            Self::TypingUpdate { .. } => "typing.update",
            Self::MessageNew { .. } => "message.new",
            Self::MessageDelivered { .. } => "message.delivered",
            Self::MessageRead { .. } => "message.read",
            Self::MessageEdited { .. } => "message.edited",
            Self::MessageDeleted { .. } => "message.deleted",
            Self::ReactionAdded { .. } => "reaction.added",
            Self::CallIncoming { .. } => "call.incoming",
            Self::CallAccepted { .. } => "call.accepted",
            Self::CallRejected { .. } => "call.rejected",
            Self::CallEnded { .. } => "call.ended",
        }
    }

    /// Serialize for the wire, stamping the timestamp.
    ///
    /// This is the only place event serialization happens.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Some(map) = value.as_object_mut() {
            map.insert(
                "timestamp".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
        serde_json::to_string(&value)
    }
}
