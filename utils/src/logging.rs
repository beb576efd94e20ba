//! Structured logging initialization via `tracing`.

use tracing_subscriber::EnvFilter;

/// Initialize a plain tracing subscriber for command-line tools.
///
/// Respects `RUST_LOG`; falls back to `default_directive` (e.g. `"warn"`)
/// when it is unset or invalid. Calling it twice is harmless.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
