//! CLI command builders for tests

use assert_cmd::Command;

/// Command for the `chat` binary with a clean environment.
///
/// Sets `RUST_LOG=error` so log lines never leak into asserted output.
///
/// # Example
///
/// ```rust,no_run
/// use chat_test_helpers::cli::chat_command;
///
/// chat_command().arg("--version").assert().success();
/// ```
#[allow(deprecated)]
pub fn chat_command() -> Command {
    let mut cmd = Command::cargo_bin("chat").expect("Failed to find chat binary");
    cmd.env("RUST_LOG", "error");
    cmd
}
