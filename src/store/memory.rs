//! In-process implementations of the storage gateways.
//!
//! These back the server binary and the test suite. Arrival order is
//! tracked explicitly (a sequence counter) so conversation listings stay
//! stable even when timestamps collide.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Message, MessageStatus, NewMessage, UserProfile};
use crate::store::{MessageStore, UserDirectory};

struct StoredMessage {
    seq: u64,
    message: Message,
}

#[derive(Clone, Default)]
pub struct MemoryMessageStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    messages: RwLock<HashMap<Uuid, StoredMessage>>,
    next_seq: AtomicU64,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully-formed message, keeping arrival order. Lets tests
    /// and admin tooling construct records with a chosen id, status or
    /// `created_at` (e.g. aged past a policy window).
    pub async fn seed(&self, message: Message) {
        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.inner.messages.write().await;
        guard.insert(message.id, StoredMessage { seq, message });
    }

    pub async fn len(&self) -> usize {
        self.inner.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.messages.read().await.is_empty()
    }
}

fn is_between(message: &Message, user_a: Uuid, user_b: Uuid) -> bool {
    (message.sender_id == user_a && message.receiver_id == user_b)
        || (message.sender_id == user_b && message.receiver_id == user_a)
}

#[async_trait::async_trait]
impl MessageStore for MemoryMessageStore {
    async fn insert(&self, new: NewMessage) -> AppResult<Message> {
        let message = Message {
            id: Uuid::new_v4(),
            sender_id: new.sender_id,
            receiver_id: new.receiver_id,
            text: new.text,
            image_url: new.image_url,
            status: MessageStatus::Sent,
            reply_to: new.reply_to,
            reactions: Vec::new(),
            deleted_for: Default::default(),
            is_edited: false,
            edited_at: None,
            created_at: Utc::now(),
        };

        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.inner.messages.write().await;
        guard.insert(
            message.id,
            StoredMessage {
                seq,
                message: message.clone(),
            },
        );

        Ok(message)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Message>> {
        let guard = self.inner.messages.read().await;
        Ok(guard.get(&id).map(|s| s.message.clone()))
    }

    async fn find_conversation(
        &self,
        user_a: Uuid,
        user_b: Uuid,
        viewer: Uuid,
    ) -> AppResult<Vec<Message>> {
        let guard = self.inner.messages.read().await;
        let mut rows: Vec<(u64, Message)> = guard
            .values()
            .filter(|s| is_between(&s.message, user_a, user_b) && s.message.visible_to(viewer))
            .map(|s| (s.seq, s.message.clone()))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);

        Ok(rows.into_iter().map(|(_, m)| m).collect())
    }

    async fn bulk_update_status(
        &self,
        sender: Uuid,
        receiver: Uuid,
        new_status: MessageStatus,
    ) -> AppResult<u64> {
        let mut guard = self.inner.messages.write().await;
        let mut changed = 0u64;
        for stored in guard.values_mut() {
            let m = &mut stored.message;
            if m.sender_id == sender && m.receiver_id == receiver && m.status < new_status {
                m.status = new_status;
                changed += 1;
            }
        }

        Ok(changed)
    }

    async fn aggregate_unread(&self, receiver: Uuid) -> AppResult<HashMap<Uuid, u64>> {
        let guard = self.inner.messages.read().await;
        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        for stored in guard.values() {
            let m = &stored.message;
            if m.receiver_id == receiver && m.status != MessageStatus::Read && m.visible_to(receiver)
            {
                *counts.entry(m.sender_id).or_default() += 1;
            }
        }

        Ok(counts)
    }

    async fn soft_delete_for(&self, message_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut guard = self.inner.messages.write().await;
        let stored = guard.get_mut(&message_id).ok_or(AppError::MessageNotFound)?;
        stored.message.deleted_for.insert(user_id);
        Ok(())
    }

    async fn hard_delete(&self, message_id: Uuid) -> AppResult<()> {
        let mut guard = self.inner.messages.write().await;
        guard.remove(&message_id).ok_or(AppError::MessageNotFound)?;
        Ok(())
    }

    async fn update_text(&self, message_id: Uuid, text: String) -> AppResult<Message> {
        let mut guard = self.inner.messages.write().await;
        let stored = guard.get_mut(&message_id).ok_or(AppError::MessageNotFound)?;
        stored.message.text = Some(text);
        stored.message.is_edited = true;
        stored.message.edited_at = Some(Utc::now());
        Ok(stored.message.clone())
    }

    async fn replace_reaction(
        &self,
        message_id: Uuid,
        user_id: Uuid,
        emoji: String,
    ) -> AppResult<Message> {
        let mut guard = self.inner.messages.write().await;
        let stored = guard.get_mut(&message_id).ok_or(AppError::MessageNotFound)?;
        stored.message.reactions.retain(|r| r.user_id != user_id);
        stored.message.reactions.push(crate::models::Reaction {
            user_id,
            emoji,
        });
        Ok(stored.message.clone())
    }
}

#[derive(Clone, Default)]
pub struct MemoryUserDirectory {
    users: Arc<RwLock<HashMap<Uuid, UserProfile>>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn upsert(&self, profile: UserProfile) -> AppResult<()> {
        let mut guard = self.users.write().await;
        guard.insert(profile.id, profile);
        Ok(())
    }

    async fn find(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let guard = self.users.read().await;
        Ok(guard.get(&user_id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<UserProfile>> {
        let guard = self.users.read().await;
        Ok(ids.iter().filter_map(|id| guard.get(id).cloned()).collect())
    }

    async fn touch_last_seen(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        let mut guard = self.users.write().await;
        if let Some(profile) = guard.get_mut(&user_id) {
            profile.last_seen_at = at;
        }
        Ok(())
    }
}
