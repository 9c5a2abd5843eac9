//! Storage gateway for the message log and the user directory.
//!
//! The service owns query semantics, not the engine. Everything below is
//! expressed as trait contracts so the backing document store stays
//! swappable; `memory` provides the in-process implementation the server
//! binary and the test suite run on.

pub mod memory;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Message, MessageStatus, NewMessage, UserProfile};

/// Gateway to the message log.
///
/// Implementations must keep `bulk_update_status` monotonic: a message is
/// promoted only when its current status precedes the target, which makes
/// the operation idempotent under concurrent repeats.
#[async_trait::async_trait]
pub trait MessageStore: Send + Sync {
    /// Persists a new message, assigning id, timestamp and `Sent` status.
    async fn insert(&self, new: NewMessage) -> AppResult<Message>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Message>>;

    /// All messages between two users, ascending by creation time,
    /// excluding those the viewer has removed from their own view.
    async fn find_conversation(
        &self,
        user_a: Uuid,
        user_b: Uuid,
        viewer: Uuid,
    ) -> AppResult<Vec<Message>>;

    /// Promotes every message from `sender` to `receiver` whose status
    /// precedes `new_status`. Returns the number of messages changed.
    async fn bulk_update_status(
        &self,
        sender: Uuid,
        receiver: Uuid,
        new_status: MessageStatus,
    ) -> AppResult<u64>;

    /// Unread (not yet `Read`) message counts for `receiver`, grouped by
    /// sender, excluding messages the receiver has removed from view.
    async fn aggregate_unread(&self, receiver: Uuid) -> AppResult<HashMap<Uuid, u64>>;

    /// Hides the message from `user_id`'s view. The record stays in the log.
    async fn soft_delete_for(&self, message_id: Uuid, user_id: Uuid) -> AppResult<()>;

    /// Removes the message for both participants. Reply references to it
    /// stay in place and stop resolving.
    async fn hard_delete(&self, message_id: Uuid) -> AppResult<()>;

    /// Replaces the text and marks the message edited.
    async fn update_text(&self, message_id: Uuid, text: String) -> AppResult<Message>;

    /// Sets `user_id`'s reaction, replacing any previous one. A message
    /// never holds two reactions from the same user.
    async fn replace_reaction(
        &self,
        message_id: Uuid,
        user_id: Uuid,
        emoji: String,
    ) -> AppResult<Message>;
}

/// Projection of identity-service accounts, kept in sync by the internal
/// profile endpoint. Only `last_seen_at` is mutated locally.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn upsert(&self, profile: UserProfile) -> AppResult<()>;

    async fn find(&self, user_id: Uuid) -> AppResult<Option<UserProfile>>;

    /// Batch profile lookup for stamping display names onto views. Ids the
    /// directory has not synced yet are skipped, not errors.
    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<UserProfile>>;

    /// Records presence activity. Unknown users are ignored; the directory
    /// may simply not have synced them yet.
    async fn touch_last_seen(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<()>;
}
