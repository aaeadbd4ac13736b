// Tracing setup for embedding applications and tests.

use tracing_subscriber::EnvFilter;

/// Install a global env-filtered subscriber (RUST_LOG, default "info").
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
