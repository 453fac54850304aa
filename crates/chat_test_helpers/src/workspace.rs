//! Temporary workspaces for config-driven tests

use assert_fs::prelude::*;
use assert_fs::TempDir;
use chat_config::CONFIG_FILE;

/// Temporary directory removed on drop
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Workspace with an empty `.chat` directory
pub fn init_workspace() -> TempDir {
    let temp = temp_dir();
    temp.child(".chat")
        .create_dir_all()
        .expect("Failed to create .chat directory");
    temp
}

/// Workspace whose `.chat/config.toml` holds `contents`
///
/// ```rust
/// use chat_test_helpers::workspace::workspace_with_config;
///
/// let workspace = workspace_with_config("[rooms]\nusers_root = \"people\"\n");
/// assert!(workspace.path().join(".chat/config.toml").exists());
/// ```
pub fn workspace_with_config(contents: &str) -> TempDir {
    let temp = temp_dir();
    temp.child(CONFIG_FILE)
        .write_str(contents)
        .expect("Failed to write config file");
    temp
}
