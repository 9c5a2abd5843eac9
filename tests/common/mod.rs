#![allow(dead_code)]

use chrono::{Duration, Utc};
use pulse_chat_service::{
    config::Config,
    models::{Message, MessageStatus, UserProfile},
    state::AppState,
    store::{
        memory::{MemoryMessageStore, MemoryUserDirectory},
        UserDirectory,
    },
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

/// Fully wired application over the in-memory stores, with handles to the
/// concrete stores kept around for seeding fixtures.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryMessageStore>,
    pub directory: Arc<MemoryUserDirectory>,
}

pub fn test_app() -> TestApp {
    let config = Arc::new(Config::test_defaults());
    let store = Arc::new(MemoryMessageStore::new());
    let directory = Arc::new(MemoryUserDirectory::new());
    let state = AppState::with_stores(config, store.clone(), directory.clone());
    TestApp {
        state,
        store,
        directory,
    }
}

pub async fn seed_user(directory: &MemoryUserDirectory, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    directory
        .upsert(UserProfile {
            id,
            display_name: name.to_string(),
            avatar_url: None,
            last_seen_at: Utc::now(),
        })
        .await
        .unwrap();
    id
}

/// A message fixture created `age_minutes` in the past, for exercising the
/// edit and delete-for-everyone windows without a mock clock.
pub fn aged_message(sender: Uuid, receiver: Uuid, text: &str, age_minutes: i64) -> Message {
    Message {
        id: Uuid::new_v4(),
        sender_id: sender,
        receiver_id: receiver,
        text: Some(text.to_string()),
        image_url: None,
        status: MessageStatus::Sent,
        reply_to: None,
        reactions: Vec::new(),
        deleted_for: HashSet::new(),
        is_edited: false,
        edited_at: None,
        created_at: Utc::now() - Duration::minutes(age_minutes),
    }
}

pub fn parse_frame(frame: &str) -> serde_json::Value {
    serde_json::from_str(frame).expect("socket frame is valid JSON")
}

/// Every frame currently buffered on a session's outbound channel. Events
/// are pushed synchronously by the notifying call, so by the time that call
/// returns its frames are already here.
pub fn drain_frames(rx: &mut UnboundedReceiver<String>) -> Vec<serde_json::Value> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(parse_frame(&frame));
    }
    frames
}

/// The subset of drained frames with the given event type.
pub fn frames_of_type(frames: &[serde_json::Value], event_type: &str) -> Vec<serde_json::Value> {
    frames
        .iter()
        .filter(|f| f["type"] == event_type)
        .cloned()
        .collect()
}
