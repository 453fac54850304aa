//! Tracing setup for tests

use std::sync::Once;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

static INIT: Once = Once::new();

/// Install a test-writer subscriber at `level`.
///
/// Only the first call in a test process has any effect. `RUST_LOG` wins
/// over `level` when set.
///
/// ```rust
/// use chat_test_helpers::logging::init_test_logging;
///
/// init_test_logging("debug");
/// tracing::debug!("visible with --nocapture");
/// ```
pub fn init_test_logging(level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Errors only
pub fn suppress_logs() {
    init_test_logging("error");
}
