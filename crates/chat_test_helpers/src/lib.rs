//! Shared test utilities for the chat test suites
//!
//! # Modules
//!
//! - [`workspace`]: temp directories with a `.chat/config.toml`
//! - [`cli`]: `chat` command builders with a clean environment
//! - [`logging`]: test logging configuration
//! - [`assertions`]: domain-specific predicates
//! - [`store`]: seeded and instrumented stores
//!
//! # Example
//!
//! ```rust,no_run
//! use chat_test_helpers::prelude::*;
//!
//! let workspace = workspace_with_config("[rooms]\ngeneral_room = \"lobby\"\n");
//! chat_command()
//!     .arg("--root")
//!     .arg(workspace.path())
//!     .args(["path", "--user", "alice"])
//!     .assert()
//!     .success()
//!     .stdout(is_canonical_path());
//! ```

pub mod assertions;
pub mod cli;
pub mod logging;
pub mod store;
pub mod workspace;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::cli::chat_command;
    pub use crate::logging::{init_test_logging, suppress_logs};
    pub use crate::store::{seeded_store, RecordingStore, StoreCall};
    pub use crate::workspace::{init_workspace, temp_dir, workspace_with_config};
}
