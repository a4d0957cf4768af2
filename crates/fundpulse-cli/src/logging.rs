//! Tracing subscriber setup

use anyhow::Context;
use fundpulse_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. RUST_LOG wins over the configured level;
/// output goes to stderr so stdout carries only event frames.
pub fn init(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .with_context(|| format!("Invalid log level '{}'", logging.level))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format.to_ascii_lowercase().as_str() {
        "json" => builder.json().init(),
        "compact" => builder.compact().init(),
        _ => builder.pretty().init(),
    }
    Ok(())
}
