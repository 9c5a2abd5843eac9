use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;
use uuid::Uuid;

/// Delivery state of a message.
///
/// The variants are ordered: a status only ever moves forward
/// (`Sent` -> `Delivered` -> `Read`), never backward. The store relies on
/// this ordering to keep bulk transitions idempotent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

/// A single emoji reaction. At most one entry per user is kept on a message;
/// reacting again replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Reaction {
    pub user_id: Uuid,
    pub emoji: String,
}

/// Stored message record for a 1:1 conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub status: MessageStatus,
    /// Weak reference to another message. The referent may have been deleted
    /// for everyone, in which case views render no preview.
    pub reply_to: Option<Uuid>,
    pub reactions: Vec<Reaction>,
    /// Users who removed this message from their own view. The record itself
    /// stays in the log until the sender deletes it for everyone.
    pub deleted_for: HashSet<Uuid>,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }

    /// The conversation partner of `user_id`, assuming they participate.
    pub fn peer_of(&self, user_id: Uuid) -> Uuid {
        if self.sender_id == user_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    pub fn visible_to(&self, user_id: Uuid) -> bool {
        !self.deleted_for.contains(&user_id)
    }

    pub fn age_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_minutes()
    }
}

/// Input for creating a message. Id, timestamp and initial status are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub reply_to: Option<Uuid>,
}

/// Wire shape of a message. Strips the per-user `deleted_for` set and
/// resolves the reply reference into a preview when the referent still
/// exists.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageView {
    pub id: Uuid,
    pub sender_id: Uuid,
    /// Sender's display name as the directory knows it. Absent until the
    /// profile has synced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    pub receiver_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub status: MessageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Uuid>,
    /// Absent when `reply_to` is absent or dangles; clients render a
    /// placeholder in the latter case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_preview: Option<ReplyPreview>,
    pub reactions: Vec<Reaction>,
    pub is_edited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MessageView {
    pub fn new(
        message: &Message,
        sender_name: Option<String>,
        reply_preview: Option<ReplyPreview>,
    ) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            sender_name,
            receiver_id: message.receiver_id,
            text: message.text.clone(),
            image_url: message.image_url.clone(),
            status: message.status,
            reply_to: message.reply_to,
            reply_preview,
            reactions: message.reactions.clone(),
            is_edited: message.is_edited,
            edited_at: message.edited_at,
            created_at: message.created_at,
        }
    }
}

/// Snapshot of a referenced message rendered inside a reply.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReplyPreview {
    pub id: Uuid,
    pub sender_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ReplyPreview {
    pub fn of(message: &Message, sender_name: Option<String>) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            sender_name,
            text: message.text.clone(),
            image_url: message.image_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordering_is_forward_only() {
        assert!(MessageStatus::Sent < MessageStatus::Delivered);
        assert!(MessageStatus::Delivered < MessageStatus::Read);
        assert!(MessageStatus::Sent < MessageStatus::Read);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&MessageStatus::Delivered).unwrap();
        assert_eq!(json, "\"delivered\"");
    }

    #[test]
    fn test_peer_of_resolves_either_side() {
        let sender = Uuid::new_v4();
        let receiver = Uuid::new_v4();
        let message = Message {
            id: Uuid::new_v4(),
            sender_id: sender,
            receiver_id: receiver,
            text: Some("hi".into()),
            image_url: None,
            status: MessageStatus::Sent,
            reply_to: None,
            reactions: Vec::new(),
            deleted_for: HashSet::new(),
            is_edited: false,
            edited_at: None,
            created_at: Utc::now(),
        };

        assert_eq!(message.peer_of(sender), receiver);
        assert_eq!(message.peer_of(receiver), sender);
        assert!(message.is_participant(sender));
        assert!(!message.is_participant(Uuid::new_v4()));
    }

    #[test]
    fn test_view_hides_deleted_for_set() {
        let mut deleted_for = HashSet::new();
        deleted_for.insert(Uuid::new_v4());
        let message = Message {
            id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            receiver_id: Uuid::new_v4(),
            text: Some("hi".into()),
            image_url: None,
            status: MessageStatus::Sent,
            reply_to: None,
            reactions: Vec::new(),
            deleted_for,
            is_edited: false,
            edited_at: None,
            created_at: Utc::now(),
        };

        let view = MessageView::new(&message, None, None);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("deleted_for").is_none());
        assert!(json.get("reply_preview").is_none());
        assert!(json.get("sender_name").is_none());
    }
}
