//! # Chat Sync Core
//!
//! Realtime synchronization and chat-room addressing for the chat client.
//!
//! ## Architecture
//!
//! - **Paths**: order-independent canonical paths for private rooms
//! - **Registry**: at most one child-added subscription per logical slot
//! - **Events**: raw store records decoded into typed events, malformed ones dropped
//! - **Session**: current user/peer driving teardown-then-install of subscriptions
//! - **Actor**: the session on its own task, driven over channels
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chat_sync::{MemoryStore, SessionHandle, SyncConfig, SyncSession};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> chat_sync::Result<()> {
//!     let store = Arc::new(MemoryStore::new());
//!     let session = SyncSession::new(store, SyncConfig::default());
//!     let (handle, _task, mut events) = SessionHandle::spawn(session);
//!
//!     handle.set_current_user("alice@example.com").await?;
//!     handle.set_current_peer(Some("bob@example.com")).await?;
//!     handle.send_message("hello").await?;
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod auth;
pub mod config;
pub mod conversation;
pub mod events;
pub mod memory;
pub mod path;
pub mod registry;
pub mod session;
pub mod store;

pub use actor::{SessionHandle, SessionTask};
pub use auth::{AccountService, Authenticator, MemoryAuth};
pub use config::SyncConfig;
pub use conversation::{Feedback, MessageList, UserDirectory};
pub use events::{MessageRecord, SyncEvent, UserRecord};
pub use memory::MemoryStore;
pub use path::{CanonicalPath, PathResolver};
pub use registry::{Slot, Subscribed, SubscriptionId, SubscriptionRegistry};
pub use session::{SessionEvent, SyncSession};
pub use store::{ChildRecord, ChildSink, RemoteStore, StoreHandle};

/// Common result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur during sync operations
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Account already exists: {0}")]
    AccountExists(String),

    #[error("Session closed: {0}")]
    SessionClosed(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] anyhow::Error),
}
