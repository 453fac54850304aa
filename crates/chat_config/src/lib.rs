//! Configuration management for the chat client
//!
//! This crate handles loading and validating `.chat/config.toml`

use chat_common::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Location of the config file relative to the workspace root
pub const CONFIG_FILE: &str = ".chat/config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root the config was loaded from (set programmatically, not in TOML)
    #[serde(skip)]
    pub root: PathBuf,

    /// Backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Remote path layout
    #[serde(default)]
    pub rooms: RoomsConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend configuration ([backend])
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "https://io.datasync.orange.com/base/chatdemo".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Remote path layout ([rooms])
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomsConfig {
    /// Collection holding every conversation
    #[serde(default = "default_chats_root")]
    pub chats_root: String,

    /// Child of `chats_root` used for the public room
    #[serde(default = "default_general_room")]
    pub general_room: String,

    /// Collection holding one entry per known user
    #[serde(default = "default_users_root")]
    pub users_root: String,
}

fn default_chats_root() -> String {
    "chats".to_string()
}
fn default_general_room() -> String {
    "general".to_string()
}
fn default_users_root() -> String {
    "users".to_string()
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            chats_root: default_chats_root(),
            general_room: default_general_room(),
            users_root: default_users_root(),
        }
    }
}

/// Logging configuration ([logging])
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub json: bool,
}

impl Config {
    /// Default configuration rooted at `root`
    pub fn with_root(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            backend: BackendConfig::default(),
            rooms: RoomsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from workspace root
    pub fn load(workspace_root: &Path) -> Result<Self> {
        let config_path = workspace_root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::with_root(workspace_root));
        }

        let content = std::fs::read_to_string(&config_path)?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| ChatError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.root = workspace_root.to_path_buf();
        config
            .validate()
            .map_err(|e| ChatError::ConfigError(e.to_string()))?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("rooms.chats_root", &self.rooms.chats_root),
            ("rooms.general_room", &self.rooms.general_room),
            ("rooms.users_root", &self.rooms.users_root),
        ] {
            if value.is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            if value.contains('/') {
                anyhow::bail!("{} must be a single path segment, got {:?}", name, value);
            }
        }
        if !self.backend.base_url.starts_with("https://")
            && !self.backend.base_url.starts_with("http://")
        {
            anyhow::bail!("backend.base_url must start with http:// or https://");
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ChatError::ConfigError(format!("Failed to render config: {}", e)))
    }
}
