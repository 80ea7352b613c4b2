//! Logger setup for hosts and tools

/// Fallback filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Install env_logger with [`DEFAULT_FILTER`]; `RUST_LOG` overrides it.
///
/// # Example
/// ```
/// shatter::core::logging::init();
/// log::info!("Engine started");
/// ```
pub fn init() {
    init_with(DEFAULT_FILTER);
}

/// Install env_logger falling back to `filter`, e.g. `"info,shatter=trace"`
pub fn init_with(filter: &str) {
    builder(filter).init();
}

/// Install the logger unless one is already set.
///
/// Returns true when this call installed it. Test suites call it from
/// every test.
pub fn try_init() -> bool {
    builder(DEFAULT_FILTER).is_test(true).try_init().is_ok()
}

fn builder(filter: &str) -> env_logger::Builder {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter));
    builder.format_timestamp_millis();
    builder
}
