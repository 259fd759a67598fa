//! Shared helpers for sign-in integration tests.

pub mod socket_guard;

use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once; `RUST_LOG` controls verbosity.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
