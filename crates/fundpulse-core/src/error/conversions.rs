//! From trait implementations for PulseError conversions

use super::types::PulseError;
use crate::recovery::circuit_breaker::CircuitBreakerError;

impl From<anyhow::Error> for PulseError {
    fn from(error: anyhow::Error) -> Self {
        Self::other(error.to_string())
    }
}

impl From<std::io::Error> for PulseError {
    fn from(error: std::io::Error) -> Self {
        Self::other(format!("IO error: {}", error))
    }
}

impl From<serde_json::Error> for PulseError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<reqwest::Error> for PulseError {
    fn from(error: reqwest::Error) -> Self {
        let status_code = error.status().map(|s| s.as_u16());
        let url = error.url().map(|u| u.to_string());
        if error.is_timeout() {
            return Self::Http {
                message: format!("request timed out: {}", error),
                url,
                status_code,
            };
        }
        Self::Http {
            message: error.to_string(),
            url,
            status_code,
        }
    }
}

impl From<redis::RedisError> for PulseError {
    fn from(error: redis::RedisError) -> Self {
        Self::cache(error.to_string())
    }
}

impl From<config::ConfigError> for PulseError {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_context(error.to_string(), "Loading configuration sources")
    }
}

impl From<CircuitBreakerError<PulseError>> for PulseError {
    fn from(error: CircuitBreakerError<PulseError>) -> Self {
        match error {
            CircuitBreakerError::Open { source_name } => Self::circuit_open(source_name),
            CircuitBreakerError::OperationFailed(inner) => inner,
        }
    }
}
