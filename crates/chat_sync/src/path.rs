//! Canonical remote paths for conversations and users

use crate::config::SyncConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the two participants of a private room
pub const PRIVATE_ROOM_SEPARATOR: &str = "AND";

/// Deterministic key of a conversation or collection in the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Escape a value so it can be used as a single path segment
pub fn escape_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Derives canonical paths from conversation identities
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    config: SyncConfig,
}

impl PathResolver {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    /// Like [`PathResolver::new`] but rejects an invalid layout
    pub fn try_new(config: SyncConfig) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Path of the conversation between `user` and `peer`.
    ///
    /// `peer == None` selects the general room. The two participants of a
    /// private room are ordered before joining, so both sides resolve the
    /// same path. Returns `None` when `user` (or a present `peer`) is empty,
    /// meaning the caller must not subscribe.
    pub fn resolve(&self, user: &str, peer: Option<&str>) -> Option<CanonicalPath> {
        if user.is_empty() {
            return None;
        }

        match peer {
            None => Some(CanonicalPath(format!(
                "{}/{}",
                self.config.chats_root, self.config.general_room
            ))),
            Some("") => None,
            Some(peer) => {
                let (lesser, greater) = if user <= peer { (user, peer) } else { (peer, user) };
                let room = format!("{}{}{}", lesser, PRIVATE_ROOM_SEPARATOR, greater);
                Some(CanonicalPath(format!(
                    "{}/{}",
                    self.config.chats_root,
                    escape_segment(&room)
                )))
            }
        }
    }

    /// Path of the users collection
    pub fn users_collection(&self) -> CanonicalPath {
        CanonicalPath(self.config.users_root.clone())
    }

    /// Path of a single user entry, `None` for an empty identifier
    pub fn user_entry(&self, identifier: &str) -> Option<CanonicalPath> {
        if identifier.is_empty() {
            return None;
        }
        Some(CanonicalPath(format!(
            "{}/{}",
            self.config.users_root,
            escape_segment(identifier)
        )))
    }
}

/// Resolve with the default layout
pub fn resolve(user: &str, peer: Option<&str>) -> Option<CanonicalPath> {
    PathResolver::default().resolve(user, peer)
}
