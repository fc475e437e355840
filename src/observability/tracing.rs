//! Tracing subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable consulted for filter directives before falling back
/// to `RUST_LOG`.
pub const LOG_ENV: &str = "SQLOBJ_LOG";

/// Build the filter: `SQLOBJ_LOG`, then `RUST_LOG`, then `default_directives`.
pub fn env_filter(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives))
}

/// Install a console subscriber writing to stderr.
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing(default_directives: &str) -> bool {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    let installed = tracing_subscriber::registry()
        .with(env_filter(default_directives))
        .with(fmt_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(filter = default_directives, "Tracing initialized");
    }
    installed
}

/// Initialize tracing for tests (only logs errors).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("error")
        .with_test_writer()
        .try_init();
}
