use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset or unparsable. Warnings must reach the
/// operator in a plain run.
pub const DEFAULT_LOG_FILTER: &str = "info";

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global stdout subscriber.
pub fn init() {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
}
