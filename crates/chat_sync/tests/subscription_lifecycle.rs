//! Subscription lifecycle as observed by the store

use chat_sync::path::resolve;
use chat_sync::{SessionEvent, SyncConfig, SyncSession};
use chat_test_helpers::prelude::*;
use std::sync::Arc;

fn recording_session() -> (Arc<RecordingStore>, SyncSession<RecordingStore>) {
    suppress_logs();
    let store = Arc::new(RecordingStore::new());
    let session = SyncSession::new(Arc::clone(&store), SyncConfig::default());
    (store, session)
}

fn subscribe(path: &str) -> StoreCall {
    StoreCall::Subscribe(path.to_string())
}

fn unsubscribe(path: &str) -> StoreCall {
    StoreCall::Unsubscribe(path.to_string())
}

#[test]
fn test_resolve_is_symmetric() {
    let identifiers = [
        "alice",
        "bob",
        "alice@example.com",
        "Zed",
        "zed",
        "a",
        "ab",
        "with space",
        "ünï",
    ];
    for x in identifiers {
        for y in identifiers {
            if x == y {
                continue;
            }
            let forward = resolve(x, Some(y));
            assert!(forward.is_some(), "{} / {}", x, y);
            assert_eq!(forward, resolve(y, Some(x)), "{} / {}", x, y);
        }
    }
}

#[test]
fn test_general_room_for_every_user() {
    for user in ["alice", "bob@example.com", "x"] {
        assert_eq!(resolve(user, None).unwrap().as_str(), "chats/general");
    }
}

#[test]
fn test_same_user_twice_subscribes_once() {
    let (store, mut session) = recording_session();
    session.set_current_user("alice");
    session.set_current_user("alice");

    assert_eq!(store.calls(), vec![subscribe("chats/general")]);
    assert_eq!(store.inner().listener_count("chats/general"), 1);
    assert_eq!(session.registry().active_count(), 1);
}

#[test]
fn test_peer_switch_unsubscribes_before_subscribing() {
    let (store, mut session) = recording_session();
    session.set_current_user("alice");
    session.set_current_peer(Some("bob"));
    store.clear();

    session.set_current_peer(Some("carol"));

    assert_eq!(
        store.calls(),
        vec![unsubscribe("chats/aliceANDbob"), subscribe("chats/aliceANDcarol")]
    );
    assert_eq!(store.inner().total_listeners(), 1);
}

#[test]
fn test_same_peer_again_is_silent() {
    let (store, mut session) = recording_session();
    session.set_current_user("alice");
    session.set_current_peer(Some("bob"));
    session.drain_events();
    store.clear();

    session.set_current_peer(Some("bob"));

    assert!(store.calls().is_empty());
    assert!(session.drain_events().is_empty());
}

#[test]
fn test_user_switch_tears_down_then_resubscribes() {
    let (store, mut session) = recording_session();
    session.set_current_user("alice");
    store.clear();

    session.set_current_user("bob");

    assert_eq!(
        store.calls(),
        vec![unsubscribe("chats/general"), subscribe("chats/general")]
    );
}

#[test]
fn test_users_slot_untouched_by_conversation_changes() {
    let (store, mut session) = recording_session();
    session.watch_users();
    session.set_current_user("alice");
    session.set_current_peer(Some("bob"));
    session.set_current_user("");

    let users_calls: Vec<_> = store
        .calls()
        .into_iter()
        .filter(|call| matches!(call, StoreCall::Subscribe(p) | StoreCall::Unsubscribe(p) if p == "users"))
        .collect();
    assert_eq!(users_calls, vec![subscribe("users")]);
    assert_eq!(store.inner().total_listeners(), 1);
}

#[test]
fn test_dropping_session_releases_listeners() {
    let (store, mut session) = recording_session();
    session.set_current_user("alice");
    session.watch_users();
    drop(session);

    assert_eq!(store.inner().total_listeners(), 0);
    let unsubscribes = store
        .calls()
        .into_iter()
        .filter(|call| matches!(call, StoreCall::Unsubscribe(_)))
        .count();
    assert_eq!(unsubscribes, 2);
}

#[test]
fn test_unresolvable_peer_leaves_no_subscription() {
    let (store, mut session) = recording_session();
    session.set_current_user("alice");
    session.drain_events();
    store.clear();

    session.set_current_peer(Some(""));

    assert_eq!(store.calls(), vec![unsubscribe("chats/general")]);
    assert_eq!(
        session.drain_events(),
        vec![SessionEvent::ConversationChanged { path: None }]
    );
}
