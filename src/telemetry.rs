use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global tracing subscriber described by `config`.
///
/// `RUST_LOG` overrides the configured level. Calling this again once a
/// subscriber is installed is a no-op.
pub fn init(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };

    if result.is_ok() {
        tracing::debug!(level = %config.level, format = %config.format, "tracing initialized");
    }
}
