//! Configuration for the sync core

use chat_config::{Config, RoomsConfig};
use serde::{Deserialize, Serialize};

/// Remote path layout used by the sync core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Collection under which every conversation lives
    pub chats_root: String,

    /// Child of `chats_root` holding the public room
    pub general_room: String,

    /// Collection with one entry per registered user
    pub users_root: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::from(&RoomsConfig::default())
    }
}

impl From<&RoomsConfig> for SyncConfig {
    fn from(rooms: &RoomsConfig) -> Self {
        Self {
            chats_root: rooms.chats_root.clone(),
            general_room: rooms.general_room.clone(),
            users_root: rooms.users_root.clone(),
        }
    }
}

impl From<&Config> for SyncConfig {
    fn from(config: &Config) -> Self {
        Self::from(&config.rooms)
    }
}

impl SyncConfig {
    /// Validate configuration
    ///
    /// Every root is a single, non-empty path segment, the same rule
    /// `chat_config::Config::validate` applies to `[rooms]`.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("chats_root", &self.chats_root),
            ("general_room", &self.general_room),
            ("users_root", &self.users_root),
        ] {
            if value.is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            if value.contains('/') {
                anyhow::bail!("{} must be a single path segment, got {:?}", name, value);
            }
        }
        if self.chats_root == self.users_root {
            anyhow::bail!("chats_root and users_root must differ");
        }
        Ok(())
    }
}
