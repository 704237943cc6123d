//! Logging
//!
//! tracing subscriber setup. Logs go to stderr so stdout stays a clean
//! event stream.

use std::sync::Once;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Build the filter: `RUST_LOG` wins, then the configured level, then `info`.
pub fn resolve_env_filter(default_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::try_new(default_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging once per process. Later calls are no-ops.
pub fn init_logging(default_level: &str) {
    INIT.call_once(|| {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr);
        let _ = tracing_subscriber::registry()
            .with(resolve_env_filter(default_level))
            .with(fmt_layer)
            .try_init();
    });
}
