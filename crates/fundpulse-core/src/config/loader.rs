//! Configuration loading

use super::model::{DEFAULT_LLM_BASE_URL, PulseConfig};
use crate::error::PulseResult;
use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::Path;
use tracing::debug;

/// Prefix for environment overrides, e.g. `FUNDPULSE__LLM__MODEL`
pub const ENV_PREFIX: &str = "FUNDPULSE";

/// Load configuration from defaults, an optional TOML file and the environment.
///
/// A `.env` file in the working directory is loaded first when present.
pub fn load_config(path: Option<&Path>) -> PulseResult<PulseConfig> {
    if dotenv::dotenv().is_ok() {
        debug!("Loaded variables from .env");
    }

    let mut builder = Config::builder();
    if let Some(path) = path {
        debug!(path = %path.display(), "Loading configuration file");
        builder = builder.add_source(File::from(path).format(FileFormat::Toml));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let mut config: PulseConfig = builder.build()?.try_deserialize()?;
    apply_provider_env_fallbacks(&mut config);
    config.validate()?;
    Ok(config)
}

/// Load configuration from an in-memory TOML document, without consulting
/// the environment.
pub fn load_config_from_str(toml: &str) -> PulseResult<PulseConfig> {
    let config: PulseConfig = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?
        .try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Fill empty LLM fields from the conventional `OPENAI_*` variables
fn apply_provider_env_fallbacks(config: &mut PulseConfig) {
    if config.llm.api_key.is_empty() {
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            config.llm.api_key = key;
        }
    }
    if config.llm.model.is_empty() {
        if let Ok(model) = env::var("OPENAI_MODEL") {
            config.llm.model = model;
        }
    }
    if config.llm.base_url == DEFAULT_LLM_BASE_URL {
        if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
            config.llm.base_url = base_url;
        }
    }
}
