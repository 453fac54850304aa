//! Seam to the remote key-path store
//!
//! The backend is a tree of JSON values addressed by `/`-separated paths.
//! Consumers only observe it through child-added streams; every call here
//! is fire-and-forget and never blocks on an acknowledgement.

use serde_json::{Map, Value};
use tokio::sync::mpsc;

/// A child that appeared under a subscribed path
#[derive(Debug, Clone, PartialEq)]
pub struct ChildRecord {
    /// Path the subscription was installed on
    pub path: String,

    /// Key of the child under `path`
    pub key: String,

    /// Raw child payload, not yet decoded
    pub value: Value,
}

/// Callback invoked by the store for every child delivered to a listener.
///
/// Returns `false` once the receiving side is gone; the store may then drop
/// the listener on its own.
pub type ChildSink = Box<dyn Fn(ChildRecord) -> bool + Send + Sync>;

/// Sink that forwards every record into an unbounded channel
pub fn channel_sink() -> (ChildSink, mpsc::UnboundedReceiver<ChildRecord>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink: ChildSink = Box::new(move |record| tx.send(record).is_ok());
    (sink, rx)
}

/// Identifies one listener installed on the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreHandle(pub u64);

/// Remote tree-structured store with child-added subscriptions
pub trait RemoteStore: Send + Sync {
    /// Start streaming children of `path` into `sink`.
    ///
    /// Every existing child is delivered first, in storage order, followed
    /// by children added after registration. An unreachable or unknown
    /// path simply yields nothing.
    fn subscribe_child_added(&self, path: &str, sink: ChildSink) -> StoreHandle;

    /// Stop a listener. Unknown handles are ignored.
    fn unsubscribe_child_added(&self, path: &str, handle: StoreHandle);

    /// Insert a new child under `path` with a store-assigned, ordered key
    fn append(&self, path: &str, record: Map<String, Value>) -> String;

    /// Replace the value stored at exactly `path`
    fn set(&self, path: &str, record: Map<String, Value>);
}

impl<T: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<T> {
    fn subscribe_child_added(&self, path: &str, sink: ChildSink) -> StoreHandle {
        (**self).subscribe_child_added(path, sink)
    }

    fn unsubscribe_child_added(&self, path: &str, handle: StoreHandle) {
        (**self).unsubscribe_child_added(path, handle)
    }

    fn append(&self, path: &str, record: Map<String, Value>) -> String {
        (**self).append(path, record)
    }

    fn set(&self, path: &str, record: Map<String, Value>) {
        (**self).set(path, record)
    }
}
