//! Logging setup and structured run events
//!
//! Logs go to stderr so that rendered reports on stdout stay clean.
//! `RUST_LOG` takes precedence over the verbosity flag.

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::MetricsError;

/// Log level for a `-v` count
pub fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the global subscriber; later calls are ignored
pub fn init_tracing(verbosity: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));

    let json_layer = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init();
}

/// Record a deployment that was skipped because its metrics failed
///
/// Logged at `info`: callers report failures to the user from the returned
/// `CollectionReport`.
pub fn log_deployment_failure(deployment: &str, error: &MetricsError) {
    info!(
        deployment,
        status = error.status(),
        error = %error,
        "Skipping deployment"
    );
}
