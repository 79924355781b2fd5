//! Shared helpers for the end-to-end job lifecycle tests

use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Install a test-friendly tracing subscriber once per test binary
///
/// Honors `RUST_LOG`; falls back to `jobline_core=debug`. Set
/// `JOBLINE_LOG_FORMAT=json` for structured output.
pub fn init_tracing() {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("jobline_core=debug"))
            .unwrap_or_default();
        let json = std::env::var("JOBLINE_LOG_FORMAT").is_ok_and(|f| f == "json");

        let registry = tracing_subscriber::registry().with(env_filter);
        let result = if json {
            registry.with(fmt::layer().json().with_test_writer()).try_init()
        } else {
            registry.with(fmt::layer().with_test_writer()).try_init()
        };
        if let Err(e) = result {
            eprintln!("tracing already initialised: {e}");
        }
    });
}
