//! Diagnostic logging setup
//!
//! Logs go to stderr so stdout carries only results (JSON values, reports).

use crate::config::Verbosity;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` overrides the level derived
/// from `-v`/`-q`.
pub fn init_logging(verbosity: Verbosity, color: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(color)
        .with_target(verbosity == Verbosity::Debug)
        .compact()
        .try_init();
}
