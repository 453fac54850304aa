//! Telemetry and logging initialization
//!
//! Provides structured logging with `tracing` and `tracing-subscriber`.
//! stdout carries command output (paths, events), all logs go to stderr.

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Subscriber writing to `writer`.
///
/// `verbose` raises the default level from INFO to DEBUG; `RUST_LOG` wins
/// over both. `json_format` switches from compact lines to one JSON object
/// per event.
pub fn build_subscriber<W>(
    verbose: bool,
    json_format: bool,
    writer: W,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter_level = if verbose { "debug,tokio=info" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json_format {
        Box::new(registry.with(tracing_subscriber::fmt::layer().json().with_writer(writer)))
    } else {
        Box::new(
            registry.with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_target(false)
                    .compact(),
            ),
        )
    }
}

/// Install the process-wide subscriber on stderr.
///
/// Later calls keep the subscriber installed first.
///
/// # Example
/// ```
/// chat_common::telemetry::init_tracing(false, false);
/// tracing::info!("Application started");
/// ```
pub fn init_tracing(verbose: bool, json_format: bool) {
    if tracing::subscriber::set_global_default(build_subscriber(
        verbose,
        json_format,
        std::io::stderr,
    ))
    .is_err()
    {
        tracing::debug!("global subscriber already installed");
    }
}
