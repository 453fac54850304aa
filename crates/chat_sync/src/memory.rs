//! In-process implementation of [`RemoteStore`]
//!
//! Children are kept in key order, which for push keys is insertion order.
//! Backfill and live delivery both happen while the store lock is held, so
//! a subscriber always sees its backfill before any later append.

use crate::store::{ChildRecord, ChildSink, RemoteStore, StoreHandle};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

struct Listener {
    path: String,
    sink: ChildSink,
}

#[derive(Default)]
struct StoreState {
    /// parent path -> child key -> value
    nodes: HashMap<String, BTreeMap<String, Value>>,
    listeners: HashMap<u64, Listener>,
    next_handle: u64,
    push_seq: u64,
    last_push_millis: i64,
}

impl StoreState {
    fn next_push_key(&mut self) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        self.last_push_millis = self.last_push_millis.max(now);
        self.push_seq += 1;
        format!("-{:012x}{:08x}", self.last_push_millis, self.push_seq)
    }

    /// Deliver a freshly added child to every listener on `parent`.
    /// Listeners whose receiver is gone are dropped.
    fn notify(&mut self, parent: &str, key: &str, value: &Value) {
        self.listeners.retain(|handle, listener| {
            if listener.path != parent {
                return true;
            }
            let record = ChildRecord {
                path: parent.to_string(),
                key: key.to_string(),
                value: value.clone(),
            };
            if !(listener.sink)(record) {
                tracing::debug!(handle, path = parent, "dropping listener with closed sink");
                return false;
            }
            true
        });
    }
}

fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn split_parent(path: &str) -> (String, String) {
    let path = normalize(path);
    match path.rsplit_once('/') {
        Some((parent, key)) => (parent.to_string(), key.to_string()),
        None => (String::new(), path),
    }
}

/// Tree store living in process memory
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Children of `path` in storage order
    pub fn children(&self, path: &str) -> Vec<(String, Value)> {
        self.state()
            .nodes
            .get(&normalize(path))
            .map(|children| {
                children
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of live listeners on `path`
    pub fn listener_count(&self, path: &str) -> usize {
        let path = normalize(path);
        self.state()
            .listeners
            .values()
            .filter(|listener| listener.path == path)
            .count()
    }

    /// Number of live listeners across all paths
    pub fn total_listeners(&self) -> usize {
        self.state().listeners.len()
    }
}

impl RemoteStore for MemoryStore {
    fn subscribe_child_added(&self, path: &str, sink: ChildSink) -> StoreHandle {
        let path = normalize(path);
        let mut state = self.state();

        if let Some(children) = state.nodes.get(&path) {
            for (key, value) in children {
                let record = ChildRecord {
                    path: path.clone(),
                    key: key.clone(),
                    value: value.clone(),
                };
                if !sink(record) {
                    break;
                }
            }
        }

        state.next_handle += 1;
        let handle = state.next_handle;
        state.listeners.insert(handle, Listener { path: path.clone(), sink });
        tracing::trace!(handle, path = %path, "listener installed");
        StoreHandle(handle)
    }

    fn unsubscribe_child_added(&self, path: &str, handle: StoreHandle) {
        let mut state = self.state();
        if state.listeners.remove(&handle.0).is_some() {
            tracing::trace!(handle = handle.0, path, "listener removed");
        }
    }

    fn append(&self, path: &str, record: Map<String, Value>) -> String {
        let parent = normalize(path);
        let value = Value::Object(record);
        let mut state = self.state();

        let key = state.next_push_key();
        state
            .nodes
            .entry(parent.clone())
            .or_default()
            .insert(key.clone(), value.clone());
        state.notify(&parent, &key, &value);
        key
    }

    fn set(&self, path: &str, record: Map<String, Value>) {
        let (parent, key) = split_parent(path);
        let value = Value::Object(record);
        let mut state = self.state();

        let previous = state
            .nodes
            .entry(parent.clone())
            .or_default()
            .insert(key.clone(), value.clone());

        // Overwriting an existing child is not a child-added event
        if previous.is_none() {
            state.notify(&parent, &key, &value);
        }
    }
}
