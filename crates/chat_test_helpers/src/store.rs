//! Store fixtures

use chat_sync::events::{MessageRecord, UserRecord};
use chat_sync::path::PathResolver;
use chat_sync::store::{ChildSink, RemoteStore, StoreHandle};
use chat_sync::MemoryStore;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

/// In-memory store holding `messages` as `(path, sender, text)` and one
/// users-collection entry per identifier in `users`
pub fn seeded_store(messages: &[(&str, &str, &str)], users: &[&str]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (path, sender, text) in messages {
        store.append(path, MessageRecord::new(*sender, *text).to_map());
    }
    let resolver = PathResolver::default();
    for user in users {
        if let Some(path) = resolver.user_entry(user) {
            store.set(path.as_str(), UserRecord::new(*user).to_map());
        }
    }
    store
}

/// Listener call observed by a [`RecordingStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Subscribe(String),
    Unsubscribe(String),
}

/// [`MemoryStore`] that logs every subscribe and unsubscribe in call order
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<StoreCall>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Calls so far, oldest first
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    /// Forget the calls recorded so far
    pub fn clear(&self) {
        self.calls.lock().expect("call log poisoned").clear();
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().expect("call log poisoned").push(call);
    }
}

impl RemoteStore for RecordingStore {
    fn subscribe_child_added(&self, path: &str, sink: ChildSink) -> StoreHandle {
        self.record(StoreCall::Subscribe(path.to_string()));
        self.inner.subscribe_child_added(path, sink)
    }

    fn unsubscribe_child_added(&self, path: &str, handle: StoreHandle) {
        self.record(StoreCall::Unsubscribe(path.to_string()));
        self.inner.unsubscribe_child_added(path, handle)
    }

    fn append(&self, path: &str, record: Map<String, Value>) -> String {
        self.inner.append(path, record)
    }

    fn set(&self, path: &str, record: Map<String, Value>) {
        self.inner.set(path, record)
    }
}
