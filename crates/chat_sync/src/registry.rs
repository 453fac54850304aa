//! At-most-one child-added subscription per logical slot
//!
//! The registry is the only place that talks to the store's subscription
//! API. Moving a slot to a new key always removes the old listener before
//! the new one is installed, and every installation gets a fresh
//! [`SubscriptionId`] so records still queued from a removed listener can be
//! recognised and discarded by the consumer.

use crate::store::{ChildRecord, RemoteStore, StoreHandle};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Logical stream a subscription feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Messages of the current conversation
    Conversation,
    /// The users collection
    Users,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Conversation => f.write_str("conversation"),
            Slot::Users => f.write_str("users"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Outcome of [`SubscriptionRegistry::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscribed {
    /// A new listener was installed
    Installed(SubscriptionId),
    /// The slot already listened to this key; nothing changed
    Reaffirmed(SubscriptionId),
}

impl Subscribed {
    pub fn id(self) -> SubscriptionId {
        match self {
            Subscribed::Installed(id) | Subscribed::Reaffirmed(id) => id,
        }
    }
}

/// A record delivered by the store, tagged with the subscription it came from
#[derive(Debug, Clone)]
pub struct Delivery {
    pub id: SubscriptionId,
    pub slot: Slot,
    pub record: ChildRecord,
}

#[derive(Debug)]
struct ActiveSubscription {
    id: SubscriptionId,
    key: String,
    handle: StoreHandle,
}

pub struct SubscriptionRegistry<S: RemoteStore> {
    store: Arc<S>,
    active: HashMap<Slot, ActiveSubscription>,
    next_id: u64,
    deliveries: mpsc::UnboundedSender<Delivery>,
}

impl<S: RemoteStore> SubscriptionRegistry<S> {
    /// Create a registry and the receiving end every subscription feeds
    pub fn new(store: Arc<S>) -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (deliveries, rx) = mpsc::unbounded_channel();
        let registry = Self {
            store,
            active: HashMap::new(),
            next_id: 0,
            deliveries,
        };
        (registry, rx)
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Point `slot` at `key`.
    ///
    /// Re-subscribing to the key the slot already follows is a no-op.
    /// Otherwise the previous listener is removed first, then the new one is
    /// installed; the store then streams its backfill followed by live records.
    pub fn subscribe(&mut self, slot: Slot, key: &str) -> Subscribed {
        if let Some(current) = self.active.get(&slot) {
            if current.key == key {
                tracing::debug!(%slot, key, id = current.id.0, "subscription reaffirmed");
                return Subscribed::Reaffirmed(current.id);
            }
        }

        self.unsubscribe(slot);

        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        let tx = self.deliveries.clone();
        let handle = self.store.subscribe_child_added(
            key,
            Box::new(move |record| tx.send(Delivery { id, slot, record }).is_ok()),
        );

        tracing::debug!(%slot, key, id = id.0, "subscription installed");
        self.active.insert(
            slot,
            ActiveSubscription {
                id,
                key: key.to_string(),
                handle,
            },
        );
        Subscribed::Installed(id)
    }

    /// Remove the listener behind `slot`. Returns whether one was live.
    pub fn unsubscribe(&mut self, slot: Slot) -> bool {
        match self.active.remove(&slot) {
            Some(previous) => {
                self.store
                    .unsubscribe_child_added(&previous.key, previous.handle);
                tracing::debug!(%slot, key = %previous.key, id = previous.id.0, "subscription removed");
                true
            }
            None => false,
        }
    }

    pub fn unsubscribe_all(&mut self) {
        for slot in [Slot::Conversation, Slot::Users] {
            self.unsubscribe(slot);
        }
    }

    /// Key currently followed by `slot`
    pub fn active_key(&self, slot: Slot) -> Option<&str> {
        self.active.get(&slot).map(|active| active.key.as_str())
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Whether `delivery` comes from the listener currently installed in its slot
    pub fn is_current(&self, delivery: &Delivery) -> bool {
        self.active
            .get(&delivery.slot)
            .is_some_and(|active| active.id == delivery.id)
    }
}

impl<S: RemoteStore> Drop for SubscriptionRegistry<S> {
    fn drop(&mut self) {
        self.unsubscribe_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MessageRecord;
    use crate::memory::MemoryStore;

    #[test]
    fn test_same_key_is_reaffirmed() {
        let store = Arc::new(MemoryStore::new());
        let (mut registry, _rx) = SubscriptionRegistry::new(Arc::clone(&store));

        let first = registry.subscribe(Slot::Conversation, "chats/general");
        let second = registry.subscribe(Slot::Conversation, "chats/general");

        assert!(matches!(first, Subscribed::Installed(_)));
        assert_eq!(second, Subscribed::Reaffirmed(first.id()));
        assert_eq!(store.listener_count("chats/general"), 1);
    }

    #[test]
    fn test_new_key_replaces_old_listener() {
        let store = Arc::new(MemoryStore::new());
        let (mut registry, _rx) = SubscriptionRegistry::new(Arc::clone(&store));

        registry.subscribe(Slot::Conversation, "chats/aliceANDbob");
        registry.subscribe(Slot::Conversation, "chats/aliceANDcarol");

        assert_eq!(store.listener_count("chats/aliceANDbob"), 0);
        assert_eq!(store.listener_count("chats/aliceANDcarol"), 1);
        assert_eq!(registry.active_key(Slot::Conversation), Some("chats/aliceANDcarol"));
    }

    #[test]
    fn test_slots_are_independent() {
        let store = Arc::new(MemoryStore::new());
        let (mut registry, _rx) = SubscriptionRegistry::new(Arc::clone(&store));

        registry.subscribe(Slot::Conversation, "chats/general");
        registry.subscribe(Slot::Users, "users");
        assert_eq!(registry.active_count(), 2);

        assert!(registry.unsubscribe(Slot::Users));
        assert!(!registry.unsubscribe(Slot::Users));
        assert_eq!(store.listener_count("chats/general"), 1);
        assert_eq!(store.listener_count("users"), 0);
    }

    #[test]
    fn test_stale_deliveries_are_detected() {
        let store = Arc::new(MemoryStore::new());
        store.append("chats/aliceANDbob", MessageRecord::new("bob", "old").to_map());
        let (mut registry, mut rx) = SubscriptionRegistry::new(Arc::clone(&store));

        registry.subscribe(Slot::Conversation, "chats/aliceANDbob");
        registry.subscribe(Slot::Conversation, "chats/general");

        let queued = rx.try_recv().unwrap();
        assert_eq!(queued.record.path, "chats/aliceANDbob");
        assert!(!registry.is_current(&queued));
    }

    #[test]
    fn test_drop_removes_every_listener() {
        let store = Arc::new(MemoryStore::new());
        {
            let (mut registry, _rx) = SubscriptionRegistry::new(Arc::clone(&store));
            registry.subscribe(Slot::Conversation, "chats/general");
            registry.subscribe(Slot::Users, "users");
            assert_eq!(store.total_listeners(), 2);
        }
        assert_eq!(store.total_listeners(), 0);
    }
}
