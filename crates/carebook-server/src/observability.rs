//! Log output for the server process.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Builds the event filter. A parsable `RUST_LOG` takes precedence over the
/// configured `logging.level`.
pub fn log_filter(level: &str, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}

/// Installs the global subscriber once the configuration is known. Request
/// spans carry the request id, so every event logged inside a handler is
/// printed with it.
pub fn init_tracing(level: &str) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let _ = tracing_subscriber::registry()
        .with(log_filter(level, rust_log.as_deref()))
        .with(fmt::layer().with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_is_used_without_rust_log() {
        assert_eq!(log_filter("debug", None).to_string(), "debug");
    }

    #[test]
    fn rust_log_overrides_configured_level() {
        let filter = log_filter("info", Some("carebook_server=trace"));
        assert!(filter.to_string().contains("carebook_server=trace"));
    }
}
