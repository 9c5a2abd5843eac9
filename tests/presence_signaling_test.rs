//! Presence and signaling semantics: full-snapshot broadcasts, the
//! one-session-per-user rule, stale-disconnect protection, and the
//! typing/call relays, all exercised against registry channels directly.

mod common;

use chrono::{Duration, Utc};
use common::{drain_frames, frames_of_type, seed_user, test_app};
use pulse_chat_service::models::UserProfile;
use pulse_chat_service::store::UserDirectory;
use pulse_chat_service::websocket::events::ServerEvent;
use pulse_chat_service::websocket::router::DeliveryOutcome;
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

fn snapshot_users(frame: &serde_json::Value) -> HashSet<String> {
    frame["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_every_connect_broadcasts_the_full_roster_to_everyone() {
    let app = test_app();
    let alice = seed_user(&app.directory, "alice").await;
    let bob = seed_user(&app.directory, "bob").await;

    let (_sid_a, mut alice_rx) = app.state.presence.connect(alice).await;

    // The first user immediately sees themselves in the snapshot.
    let frames = drain_frames(&mut alice_rx);
    let snapshots = frames_of_type(&frames, "presence.online");
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshot_users(&snapshots[0]), HashSet::from([alice.to_string()]));

    // A second connect pushes the complete roster to both, not a diff.
    let (_sid_b, mut bob_rx) = app.state.presence.connect(bob).await;
    let expected = HashSet::from([alice.to_string(), bob.to_string()]);

    let frames = drain_frames(&mut alice_rx);
    let snapshots = frames_of_type(&frames, "presence.online");
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshot_users(&snapshots[0]), expected);

    let frames = drain_frames(&mut bob_rx);
    let snapshots = frames_of_type(&frames, "presence.online");
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshot_users(&snapshots[0]), expected);
}

#[tokio::test]
async fn test_disconnect_broadcasts_the_shrunken_roster() {
    let app = test_app();
    let alice = seed_user(&app.directory, "alice").await;
    let bob = seed_user(&app.directory, "bob").await;

    let (_sid_a, mut alice_rx) = app.state.presence.connect(alice).await;
    let (sid_b, mut bob_rx) = app.state.presence.connect(bob).await;
    drain_frames(&mut alice_rx);
    drain_frames(&mut bob_rx);

    app.state.presence.disconnect(bob, sid_b).await;

    let frames = drain_frames(&mut alice_rx);
    let snapshots = frames_of_type(&frames, "presence.online");
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshot_users(&snapshots[0]), HashSet::from([alice.to_string()]));

    assert!(!app.state.presence.online_users().await.contains(&bob));
}

#[tokio::test]
async fn test_reconnect_supersedes_and_stale_disconnect_is_ignored() {
    let app = test_app();
    let alice = seed_user(&app.directory, "alice").await;

    let (old_sid, mut old_rx) = app.state.presence.connect(alice).await;
    drain_frames(&mut old_rx);

    // Second tab. The old session's channel closes.
    let (new_sid, mut new_rx) = app.state.presence.connect(alice).await;
    assert!(old_rx.recv().await.is_none());
    drain_frames(&mut new_rx);

    // The old socket's teardown fires late. It must not evict the new
    // session or broadcast anything.
    app.state.presence.disconnect(alice, old_sid).await;
    assert!(app.state.presence.online_users().await.contains(&alice));
    assert!(drain_frames(&mut new_rx).is_empty());

    app.state.presence.disconnect(alice, new_sid).await;
    assert!(app.state.presence.online_users().await.is_empty());
}

#[tokio::test]
async fn test_typing_update_reaches_only_the_target() {
    let app = test_app();
    let alice = seed_user(&app.directory, "alice").await;
    let bob = seed_user(&app.directory, "bob").await;
    let carol = seed_user(&app.directory, "carol").await;

    let (_sa, mut alice_rx) = app.state.presence.connect(alice).await;
    let (_sb, mut bob_rx) = app.state.presence.connect(bob).await;
    let (_sc, mut carol_rx) = app.state.presence.connect(carol).await;
    drain_frames(&mut alice_rx);
    drain_frames(&mut bob_rx);
    drain_frames(&mut carol_rx);

    let outcome = app
        .state
        .router
        .notify(
            bob,
            &ServerEvent::TypingUpdate {
                sender_id: alice,
                is_typing: true,
            },
        )
        .await;
    assert_eq!(outcome, DeliveryOutcome::Delivered);

    let frames = drain_frames(&mut bob_rx);
    let typing = frames_of_type(&frames, "typing.update");
    assert_eq!(typing.len(), 1);
    assert_eq!(typing[0]["sender_id"], alice.to_string());
    assert_eq!(typing[0]["is_typing"], true);

    assert!(drain_frames(&mut carol_rx).is_empty());
}

#[tokio::test]
async fn test_notify_to_offline_target_is_a_silent_miss() {
    let app = test_app();
    let nobody = Uuid::new_v4();

    let outcome = app
        .state
        .router
        .notify(
            nobody,
            &ServerEvent::TypingUpdate {
                sender_id: Uuid::new_v4(),
                is_typing: false,
            },
        )
        .await;
    assert_eq!(outcome, DeliveryOutcome::NotConnected);
}

#[tokio::test]
async fn test_call_signaling_round_trip() {
    let app = test_app();
    let alice = seed_user(&app.directory, "alice").await;
    let bob = seed_user(&app.directory, "bob").await;

    let (_sa, mut alice_rx) = app.state.presence.connect(alice).await;
    let (_sb, mut bob_rx) = app.state.presence.connect(bob).await;
    drain_frames(&mut alice_rx);
    drain_frames(&mut bob_rx);

    // Offer lands on the callee with the opaque signal intact.
    let outcome = app
        .state
        .calls
        .offer(alice, bob, "Alice".into(), json!({ "sdp": "offer-blob" }))
        .await;
    assert_eq!(outcome, DeliveryOutcome::Delivered);

    let frames = drain_frames(&mut bob_rx);
    let incoming = frames_of_type(&frames, "call.incoming");
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0]["from"], alice.to_string());
    assert_eq!(incoming[0]["name"], "Alice");
    assert_eq!(incoming[0]["signal"]["sdp"], "offer-blob");

    // Answer flows back to the caller.
    app.state
        .calls
        .answer(alice, json!({ "sdp": "answer-blob" }))
        .await;
    let frames = drain_frames(&mut alice_rx);
    let accepted = frames_of_type(&frames, "call.accepted");
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0]["signal"]["sdp"], "answer-blob");

    // Hang-up reaches the peer.
    app.state.calls.end(alice, bob).await;
    let frames = drain_frames(&mut bob_rx);
    assert_eq!(frames_of_type(&frames, "call.ended").len(), 1);
}

#[tokio::test]
async fn test_rejecting_a_call_to_an_offline_caller_is_a_miss() {
    let app = test_app();
    let bob = seed_user(&app.directory, "bob").await;
    let gone_caller = Uuid::new_v4();

    let outcome = app.state.calls.reject(bob, gone_caller).await;
    assert_eq!(outcome, DeliveryOutcome::NotConnected);
}

#[tokio::test]
async fn test_connect_and_disconnect_touch_last_seen() {
    let app = test_app();
    let alice = Uuid::new_v4();
    let stale = Utc::now() - Duration::hours(5);
    app.directory
        .upsert(UserProfile {
            id: alice,
            display_name: "alice".into(),
            avatar_url: None,
            last_seen_at: stale,
        })
        .await
        .unwrap();

    let (sid, _rx) = app.state.presence.connect(alice).await;
    let after_connect = app.directory.find(alice).await.unwrap().unwrap().last_seen_at;
    assert!(after_connect > stale);

    app.state.presence.disconnect(alice, sid).await;
    let after_disconnect = app.directory.find(alice).await.unwrap().unwrap().last_seen_at;
    assert!(after_disconnect >= after_connect);
}
