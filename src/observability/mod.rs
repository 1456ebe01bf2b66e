//! Logging setup for the binaries.
//!
//! Library code only emits `tracing` events; the binaries install a
//! subscriber writing them to stderr, so stdout stays free for process
//! output.
//!
//! # Example
//!
//! ```no_run
//! use yeti::observability::init_logging;
//!
//! init_logging(false);
//! tracing::warn!("shown");
//! tracing::debug!("hidden unless --debug or RUST_LOG");
//! ```

use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is not set.
pub fn default_level(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "warn"
    }
}

/// Filter from `RUST_LOG`, falling back to [`default_level`].
pub fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(debug)))
}

/// Install the global stderr subscriber.
///
/// Calling it again once a subscriber is installed does nothing.
pub fn init_logging(debug: bool) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(debug))
        .with_target(debug)
        .try_init();
}
