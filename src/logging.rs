//! Logging setup
//!
//! Logs go to stderr so stdout carries nothing but JSON envelopes.
//! `RUST_LOG` overrides the level chosen from the command line.

use std::io;

use tracing_subscriber::EnvFilter;

/// Default filter directive for a verbosity flag
#[must_use]
pub const fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "namedsql=debug"
    } else {
        "namedsql=warn"
    }
}

/// Install the global subscriber
///
/// Calling this twice is harmless; the second install is ignored.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
