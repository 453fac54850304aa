//! Common types and errors for the chat workspace
//!
//! This crate provides shared data structures used across all chat components.

pub mod sanitizer;
pub mod telemetry;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core error types shared by the chat crates
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A chat message as seen by a consumer of the sync core
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Identifier of the user who sent the message
    pub sender_identifier: String,

    /// Message body
    pub text: String,

    /// True when the sender is the local user, i.e. the backend echoing
    /// a message this client sent
    pub is_echo: bool,
}

/// Session information returned by the authentication backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthInfo {
    /// Email the session was opened with; doubles as the user identifier
    pub email: String,

    /// Opaque token identifying the session
    pub token: String,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ChatError>;

/// Exit code constants
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 101;
