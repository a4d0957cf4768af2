//! Configuration management for Fundpulse
//!
//! Layering, lowest to highest precedence: built-in defaults, an optional
//! TOML file, then `FUNDPULSE__SECTION__KEY` environment variables.

mod loader;
mod logging_config;
mod model;
mod validation;

pub mod timeouts;

pub use loader::{ENV_PREFIX, load_config, load_config_from_str};
pub use logging_config::LoggingConfig;
pub use model::{
    BreakerSettings, CacheSettings, HttpSettings, LlmSettings, OrchestratorSettings, PulseConfig,
    RateLimitSettings, SourceSettings, SseSettings,
};
