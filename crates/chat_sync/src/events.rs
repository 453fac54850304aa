//! Decoding of raw store records into domain events

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A chat message as stored under a conversation path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(rename = "senderIdentifier")]
    pub sender_identifier: String,
    pub text: String,
}

/// A user entry as stored in the users collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub identifier: String,
}

/// Decoded child record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    MessageAdded {
        sender_identifier: String,
        text: String,
    },
    UserAdded {
        identifier: String,
    },
}

/// Which decoder applies to a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Message,
    User,
}

impl RecordKind {
    pub fn decode(self, raw: &Value) -> Option<SyncEvent> {
        match self {
            RecordKind::Message => decode_message(raw),
            RecordKind::User => decode_user(raw),
        }
    }
}

/// Decode a conversation child. Records missing `senderIdentifier` or `text`,
/// or carrying non-string values for them, yield nothing.
pub fn decode_message(raw: &Value) -> Option<SyncEvent> {
    // Derived struct impls also accept sequences; records must be objects
    if !raw.is_object() {
        tracing::trace!("dropping non-object message record");
        return None;
    }
    match MessageRecord::deserialize(raw) {
        Ok(MessageRecord {
            sender_identifier,
            text,
        }) => Some(SyncEvent::MessageAdded {
            sender_identifier,
            text,
        }),
        Err(e) => {
            tracing::trace!("dropping malformed message record: {}", e);
            None
        }
    }
}

/// Decode a users-collection child
pub fn decode_user(raw: &Value) -> Option<SyncEvent> {
    if !raw.is_object() {
        tracing::trace!("dropping non-object user record");
        return None;
    }
    match UserRecord::deserialize(raw) {
        Ok(UserRecord { identifier }) => Some(SyncEvent::UserAdded { identifier }),
        Err(e) => {
            tracing::trace!("dropping malformed user record: {}", e);
            None
        }
    }
}

fn into_map<T: Serialize>(record: &T) -> Map<String, Value> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        // Both record types are plain structs of strings
        _ => Map::new(),
    }
}

impl MessageRecord {
    pub fn new(sender_identifier: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender_identifier: sender_identifier.into(),
            text: text.into(),
        }
    }

    pub fn to_map(&self) -> Map<String, Value> {
        into_map(self)
    }
}

impl UserRecord {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    pub fn to_map(&self) -> Map<String, Value> {
        into_map(self)
    }
}
