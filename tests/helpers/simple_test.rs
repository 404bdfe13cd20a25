//! Simple test infrastructure for basic testing

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize test environment
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("minibot=debug")
            .with_test_writer()
            .try_init();
    });
}
