//! Message lifecycle engine.
//!
//! Owns every transition a message goes through (send, deliver, read, edit,
//! delete, react) and the ordering rule that makes the system predictable:
//! the store write completes before any realtime notify is attempted, and a
//! notify that misses is simply dropped. Offline peers catch up from the
//! store on their next fetch.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::{Message, MessageStatus, MessageView, NewMessage, ReplyPreview};
use crate::store::{MessageStore, UserDirectory};
use crate::websocket::events::ServerEvent;
use crate::websocket::router::DeliveryRouter;

pub struct MessageService {
    store: Arc<dyn MessageStore>,
    directory: Arc<dyn UserDirectory>,
    router: DeliveryRouter,
    edit_window: Duration,
    delete_window: Duration,
}

impl MessageService {
    pub fn new(
        store: Arc<dyn MessageStore>,
        directory: Arc<dyn UserDirectory>,
        router: DeliveryRouter,
        config: &Config,
    ) -> Self {
        Self {
            store,
            directory,
            router,
            edit_window: Duration::minutes(config.edit_window_minutes),
            delete_window: Duration::minutes(config.delete_for_everyone_window_minutes),
        }
    }

    /// Persist a new message, then notify the receiver's live session.
    ///
    /// The insert is durable before the notify is attempted; a failed
    /// insert notifies nobody.
    pub async fn send(
        &self,
        sender: Uuid,
        receiver: Uuid,
        text: Option<String>,
        image_url: Option<String>,
        reply_to: Option<Uuid>,
    ) -> AppResult<MessageView> {
        let text = text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        let image_url = image_url.filter(|u| !u.is_empty());
        if text.is_none() && image_url.is_none() {
            return Err(AppError::BadRequest(
                "message needs text or an image".into(),
            ));
        }

        if self.directory.find(receiver).await?.is_none() {
            return Err(AppError::UserNotFound);
        }

        // Reply references are checked at send time; they may still start
        // dangling later if the referent is deleted for everyone.
        if let Some(referent) = reply_to {
            if self.store.find_by_id(referent).await?.is_none() {
                return Err(AppError::BadRequest(
                    "reply_to references a missing message".into(),
                ));
            }
        }

        let message = self
            .store
            .insert(NewMessage {
                sender_id: sender,
                receiver_id: receiver,
                text,
                image_url,
                reply_to,
            })
            .await?;
        metrics::record_message_sent();

        let view = self.view_of(&message).await?;
        self.router
            .notify(
                receiver,
                &ServerEvent::MessageNew {
                    message: view.clone(),
                },
            )
            .await;

        Ok(view)
    }

    /// The requester's conversation with `peer`, oldest first.
    ///
    /// Fetching counts as receiving: every message from `peer` still in
    /// `sent` is promoted to `delivered` first, and the peer is told their
    /// messages arrived when anything actually changed.
    pub async fn list_conversation(&self, requester: Uuid, peer: Uuid) -> AppResult<Vec<MessageView>> {
        let delivered = self
            .store
            .bulk_update_status(peer, requester, MessageStatus::Delivered)
            .await?;
        if delivered > 0 {
            self.router
                .notify(peer, &ServerEvent::MessageDelivered { user_id: requester })
                .await;
        }

        let messages = self.store.find_conversation(requester, peer, requester).await?;

        let mut views = Vec::with_capacity(messages.len());
        for message in &messages {
            views.push(self.view_of(message).await?);
        }
        Ok(views)
    }

    /// Mark everything from `peer` as read. Idempotent: repeats change
    /// nothing and emit nothing.
    pub async fn mark_read(&self, requester: Uuid, peer: Uuid) -> AppResult<u64> {
        let changed = self
            .store
            .bulk_update_status(peer, requester, MessageStatus::Read)
            .await?;
        if changed > 0 {
            self.router
                .notify(peer, &ServerEvent::MessageRead { user_id: requester })
                .await;
        }
        Ok(changed)
    }

    /// Replace the text of an own, recent message.
    pub async fn edit(&self, requester: Uuid, message_id: Uuid, text: String) -> AppResult<MessageView> {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(AppError::BadRequest("edited text must not be empty".into()));
        }

        let message = self
            .store
            .find_by_id(message_id)
            .await?
            .ok_or(AppError::MessageNotFound)?;

        if message.sender_id != requester {
            return Err(AppError::Forbidden);
        }
        if Utc::now().signed_duration_since(message.created_at) >= self.edit_window {
            return Err(AppError::EditWindowExpired {
                created_at: message.created_at,
                max_edit_minutes: self.edit_window.num_minutes(),
            });
        }

        let updated = self.store.update_text(message_id, text).await?;
        let view = self.view_of(&updated).await?;
        self.router
            .notify(
                updated.peer_of(requester),
                &ServerEvent::MessageEdited {
                    message: view.clone(),
                },
            )
            .await;

        Ok(view)
    }

    /// Delete a message.
    ///
    /// `for_everyone` removes the record for both sides (sender only,
    /// within the window) and tells the peer. Otherwise the message is
    /// merely hidden from the requester's own view, silently and with no
    /// time limit.
    pub async fn delete(&self, requester: Uuid, message_id: Uuid, for_everyone: bool) -> AppResult<()> {
        let message = self
            .store
            .find_by_id(message_id)
            .await?
            .ok_or(AppError::MessageNotFound)?;

        if for_everyone {
            if message.sender_id != requester {
                return Err(AppError::Forbidden);
            }
            if Utc::now().signed_duration_since(message.created_at) >= self.delete_window {
                return Err(AppError::DeleteWindowExpired {
                    created_at: message.created_at,
                    max_delete_minutes: self.delete_window.num_minutes(),
                });
            }

            self.store.hard_delete(message_id).await?;
            self.router
                .notify(
                    message.peer_of(requester),
                    &ServerEvent::MessageDeleted {
                        message_id,
                        delete_for_everyone: true,
                    },
                )
                .await;
        } else {
            if !message.is_participant(requester) {
                return Err(AppError::Forbidden);
            }
            self.store.soft_delete_for(message_id, requester).await?;
        }

        Ok(())
    }

    /// Set the requester's reaction on a message, replacing any previous
    /// one, and push the updated reaction list to the other participant.
    pub async fn react(&self, requester: Uuid, message_id: Uuid, emoji: String) -> AppResult<MessageView> {
        if emoji.is_empty() || emoji.len() > 20 {
            return Err(AppError::BadRequest("Invalid emoji".into()));
        }

        let message = self
            .store
            .find_by_id(message_id)
            .await?
            .ok_or(AppError::MessageNotFound)?;
        if !message.is_participant(requester) {
            return Err(AppError::Forbidden);
        }

        let updated = self.store.replace_reaction(message_id, requester, emoji).await?;
        self.router
            .notify(
                updated.peer_of(requester),
                &ServerEvent::ReactionAdded {
                    message_id,
                    reactions: updated.reactions.clone(),
                },
            )
            .await;

        self.view_of(&updated).await
    }

    /// Unread message counts for the requester, grouped by sender.
    pub async fn unread_counts(&self, requester: Uuid) -> AppResult<HashMap<Uuid, u64>> {
        self.store.aggregate_unread(requester).await
    }

    async fn view_of(&self, message: &Message) -> AppResult<MessageView> {
        let referent = match message.reply_to {
            Some(id) => self.store.find_by_id(id).await?,
            None => None,
        };

        // One directory round trip covers the author and, when the reply
        // still resolves, the quoted author too.
        let mut wanted = vec![message.sender_id];
        if let Some(referent) = &referent {
            if !wanted.contains(&referent.sender_id) {
                wanted.push(referent.sender_id);
            }
        }
        let names: HashMap<Uuid, String> = self
            .directory
            .find_many(&wanted)
            .await?
            .into_iter()
            .map(|profile| (profile.id, profile.display_name))
            .collect();

        let sender_name = names.get(&message.sender_id).cloned();
        let reply_preview = referent
            .as_ref()
            .map(|r| ReplyPreview::of(r, names.get(&r.sender_id).cloned()));

        Ok(MessageView::new(message, sender_name, reply_preview))
    }
}
