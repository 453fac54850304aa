//! Sync session: ties the conversation identity to subscription lifecycle
//!
//! Every identity change goes through the same path: tear down the previous
//! conversation listener, update state, resolve the new path, install the
//! new listener. `&mut self` on every transition keeps them serialized.

use crate::config::SyncConfig;
use crate::events::{MessageRecord, RecordKind, SyncEvent, UserRecord};
use crate::path::{CanonicalPath, PathResolver};
use crate::registry::{Delivery, Slot, Subscribed, SubscriptionRegistry};
use crate::store::RemoteStore;
use chat_common::ChatMessage;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

/// What a consumer of the session observes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The conversation target changed; previously received messages belong
    /// to another conversation. `None` means no conversation is followed.
    ConversationChanged { path: Option<CanonicalPath> },

    /// A message of the current conversation, backfilled or live
    Message(ChatMessage),

    /// An entry of the users collection, backfilled or live
    UserAdded { identifier: String },
}

pub struct SyncSession<S: RemoteStore> {
    resolver: PathResolver,
    registry: SubscriptionRegistry<S>,
    deliveries: mpsc::UnboundedReceiver<Delivery>,
    current_user: Option<String>,
    current_peer: Option<String>,
    pending: VecDeque<SessionEvent>,
}

impl<S: RemoteStore> SyncSession<S> {
    pub fn new(store: Arc<S>, config: SyncConfig) -> Self {
        let (registry, deliveries) = SubscriptionRegistry::new(store);
        Self {
            resolver: PathResolver::new(config),
            registry,
            deliveries,
            current_user: None,
            current_peer: None,
            pending: VecDeque::new(),
        }
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    pub fn current_peer(&self) -> Option<&str> {
        self.current_peer.as_deref()
    }

    /// Path of the conversation currently followed
    pub fn current_path(&self) -> Option<&str> {
        self.registry.active_key(Slot::Conversation)
    }

    pub fn registry(&self) -> &SubscriptionRegistry<S> {
        &self.registry
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Switch the local user. An empty identifier leaves the session without
    /// a conversation.
    pub fn set_current_user(&mut self, identifier: &str) {
        let identifier = (!identifier.is_empty()).then(|| identifier.to_string());

        // Echo tagging depends on the user, so a different user always gets
        // a fresh stream even when the path is unchanged
        let torn_down = if self.current_user != identifier {
            self.registry.unsubscribe(Slot::Conversation)
        } else {
            false
        };

        self.current_user = identifier;
        self.refresh_conversation(torn_down);
    }

    /// Switch the peer; `None` selects the general room.
    ///
    /// Callers must not pass the current user as peer.
    pub fn set_current_peer(&mut self, peer: Option<&str>) {
        if peer.is_some() && peer == self.current_user.as_deref() {
            tracing::warn!("peer equals the current user; private room with self");
        }
        self.current_peer = peer.map(str::to_string);
        self.refresh_conversation(false);
    }

    fn refresh_conversation(&mut self, torn_down: bool) {
        let path = self
            .current_user
            .as_deref()
            .and_then(|user| self.resolver.resolve(user, self.current_peer.as_deref()));

        match path {
            Some(path) => {
                if let Subscribed::Installed(_) =
                    self.registry.subscribe(Slot::Conversation, path.as_str())
                {
                    self.pending
                        .push_back(SessionEvent::ConversationChanged { path: Some(path) });
                }
            }
            None => {
                let removed = self.registry.unsubscribe(Slot::Conversation);
                if removed || torn_down {
                    tracing::debug!("no resolvable conversation path");
                    self.pending
                        .push_back(SessionEvent::ConversationChanged { path: None });
                }
            }
        }
    }

    /// Append a message to the current conversation.
    ///
    /// Nothing is added locally; the message reaches consumers when the
    /// store echoes it back. Returns the new child key, or `None` when no
    /// conversation path resolves.
    pub fn send_message(&self, text: &str) -> Option<String> {
        let user = self.current_user.as_deref()?;
        let Some(path) = self.resolver.resolve(user, self.current_peer.as_deref()) else {
            tracing::debug!("dropping send: no resolvable conversation path");
            return None;
        };

        let key = self
            .registry
            .store()
            .append(path.as_str(), MessageRecord::new(user, text).to_map());
        tracing::debug!(path = %path, key = %key, "message appended");
        Some(key)
    }

    /// Follow the users collection. Independent of the conversation.
    pub fn watch_users(&mut self) -> Subscribed {
        let path = self.resolver.users_collection();
        self.registry.subscribe(Slot::Users, path.as_str())
    }

    pub fn unwatch_users(&mut self) -> bool {
        self.registry.unsubscribe(Slot::Users)
    }

    /// Register `identifier` in the users collection
    pub fn add_user(&self, identifier: &str) -> Option<CanonicalPath> {
        register_user(&**self.registry.store(), &self.resolver, identifier)
    }

    /// Next event for the consumer.
    ///
    /// Cancel-safe: dropping the future before it completes loses nothing.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            let delivery = self.deliveries.recv().await?;
            if let Some(event) = self.translate(delivery) {
                return Some(event);
            }
        }
    }

    /// Every event that is ready without waiting
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut events: Vec<SessionEvent> = self.pending.drain(..).collect();
        while let Ok(delivery) = self.deliveries.try_recv() {
            if let Some(event) = self.translate(delivery) {
                events.push(event);
            }
        }
        events
    }

    fn translate(&self, delivery: Delivery) -> Option<SessionEvent> {
        if !self.registry.is_current(&delivery) {
            tracing::trace!(
                slot = %delivery.slot,
                path = %delivery.record.path,
                "discarding record from a removed subscription"
            );
            return None;
        }

        let kind = match delivery.slot {
            Slot::Conversation => RecordKind::Message,
            Slot::Users => RecordKind::User,
        };
        let event = kind.decode(&delivery.record.value)?;

        Some(match event {
            SyncEvent::MessageAdded {
                sender_identifier,
                text,
            } => {
                let is_echo = self.current_user.as_deref() == Some(sender_identifier.as_str());
                SessionEvent::Message(ChatMessage {
                    sender_identifier,
                    text,
                    is_echo,
                })
            }
            SyncEvent::UserAdded { identifier } => SessionEvent::UserAdded { identifier },
        })
    }

    /// Remove every listener. Events already queued are discarded.
    pub fn close(&mut self) {
        self.registry.unsubscribe_all();
        self.pending.clear();
        while self.deliveries.try_recv().is_ok() {}
    }
}

/// Write the users-collection entry for `identifier`; empty identifiers are ignored
pub fn register_user<S: RemoteStore + ?Sized>(
    store: &S,
    resolver: &PathResolver,
    identifier: &str,
) -> Option<CanonicalPath> {
    let path = resolver.user_entry(identifier)?;
    store.set(path.as_str(), UserRecord::new(identifier).to_map());
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn session() -> (Arc<MemoryStore>, SyncSession<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let session = SyncSession::new(Arc::clone(&store), SyncConfig::default());
        (store, session)
    }

    fn message(sender: &str, text: &str, is_echo: bool) -> SessionEvent {
        SessionEvent::Message(ChatMessage {
            sender_identifier: sender.to_string(),
            text: text.to_string(),
            is_echo,
        })
    }

    fn changed(user: &str, peer: Option<&str>) -> SessionEvent {
        SessionEvent::ConversationChanged {
            path: crate::path::resolve(user, peer),
        }
    }

    #[test]
    fn test_backfill_of_private_room() {
        let (store, mut session) = session();
        store.append("chats/aliceANDbob", MessageRecord::new("bob", "hi").to_map());

        session.set_current_user("alice");
        session.set_current_peer(Some("bob"));

        let events = session.drain_events();
        assert_eq!(
            events,
            vec![
                changed("alice", None),
                changed("alice", Some("bob")),
                message("bob", "hi", false),
            ]
        );
    }

    #[test]
    fn test_send_is_echoed_not_appended_locally() {
        let (store, mut session) = session();
        session.set_current_user("alice");
        session.set_current_peer(Some("bob"));
        session.drain_events();

        let key = session.send_message("hello");
        assert!(key.is_some());
        assert_eq!(store.children("chats/aliceANDbob").len(), 1);
        assert_eq!(session.drain_events(), vec![message("alice", "hello", true)]);
    }

    #[test]
    fn test_same_user_twice_keeps_one_subscription() {
        let (store, mut session) = session();
        session.set_current_user("alice");
        session.set_current_user("alice");

        assert_eq!(store.total_listeners(), 1);
        assert_eq!(session.drain_events(), vec![changed("alice", None)]);
    }

    #[test]
    fn test_user_change_resubscribes_same_path() {
        let (store, mut session) = session();
        store.append("chats/general", MessageRecord::new("alice", "yo").to_map());

        session.set_current_user("alice");
        assert_eq!(
            session.drain_events(),
            vec![changed("alice", None), message("alice", "yo", true)]
        );

        session.set_current_user("bob");
        assert_eq!(store.total_listeners(), 1);
        assert_eq!(
            session.drain_events(),
            vec![changed("alice", None), message("alice", "yo", false)]
        );
    }

    #[test]
    fn test_empty_user_tears_down() {
        let (store, mut session) = session();
        session.set_current_user("alice");
        session.drain_events();

        session.set_current_user("");
        assert_eq!(store.total_listeners(), 0);
        assert_eq!(
            session.drain_events(),
            vec![SessionEvent::ConversationChanged { path: None }]
        );
        assert!(session.send_message("lost").is_none());
        assert!(store.children("chats/general").is_empty());
    }

    #[test]
    fn test_empty_peer_does_not_subscribe() {
        let (store, mut session) = session();
        session.set_current_user("alice");
        session.set_current_peer(Some(""));

        assert_eq!(store.total_listeners(), 0);
        assert_eq!(session.current_path(), None);
    }

    #[test]
    fn test_queued_records_of_old_conversation_are_discarded() {
        let (store, mut session) = session();
        store.append("chats/aliceANDbob", MessageRecord::new("bob", "for bob").to_map());
        store.append("chats/aliceANDcarol", MessageRecord::new("carol", "for carol").to_map());

        session.set_current_user("alice");
        session.set_current_peer(Some("bob"));
        session.set_current_peer(Some("carol"));

        let messages: Vec<_> = session
            .drain_events()
            .into_iter()
            .filter(|event| matches!(event, SessionEvent::Message(_)))
            .collect();
        assert_eq!(messages, vec![message("carol", "for carol", false)]);
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let (store, mut session) = session();
        let mut partial = serde_json::Map::new();
        partial.insert("senderIdentifier".to_string(), "a".into());
        store.append("chats/general", partial);
        store.append("chats/general", MessageRecord::new("b", "ok").to_map());

        session.set_current_user("alice");
        assert_eq!(
            session.drain_events(),
            vec![changed("alice", None), message("b", "ok", false)]
        );
    }

    #[test]
    fn test_users_slot_is_independent() {
        let (store, mut session) = session();
        session.add_user("carol");
        session.watch_users();
        session.set_current_user("alice");
        session.set_current_peer(Some("carol"));
        session.add_user("dave");

        let users: Vec<_> = session
            .drain_events()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::UserAdded { identifier } => Some(identifier),
                _ => None,
            })
            .collect();
        assert_eq!(users, vec!["carol".to_string(), "dave".to_string()]);
        assert_eq!(store.listener_count("users"), 1);

        assert!(session.unwatch_users());
        assert_eq!(store.listener_count("users"), 0);
        assert_eq!(store.listener_count("chats/aliceANDcarol"), 1);
    }

    #[test]
    fn test_close_releases_everything() {
        let (store, mut session) = session();
        session.set_current_user("alice");
        session.watch_users();

        session.close();
        assert_eq!(store.total_listeners(), 0);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn test_events_serialize_with_tag() {
        let changed = serde_json::to_value(changed("alice", Some("bob"))).unwrap();
        assert_eq!(
            changed,
            serde_json::json!({ "event": "conversation_changed", "path": "chats/aliceANDbob" })
        );

        let echo = serde_json::to_value(message("alice", "hi", true)).unwrap();
        assert_eq!(echo["event"], "message");
        assert_eq!(echo["is_echo"], true);
    }

    #[tokio::test]
    async fn test_next_event_waits_for_live_record() {
        let (store, mut session) = session();
        session.set_current_user("alice");
        assert_eq!(session.next_event().await, Some(changed("alice", None)));

        let writer = Arc::clone(&store);
        tokio::spawn(async move {
            writer.append("chats/general", MessageRecord::new("bob", "late").to_map());
        });

        assert_eq!(session.next_event().await, Some(message("bob", "late", false)));
    }
}
