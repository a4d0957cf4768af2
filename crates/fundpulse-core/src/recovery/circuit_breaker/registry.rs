//! Circuit breaker registry, one breaker per source name

use dashmap::DashMap;
use std::sync::Arc;

use super::breaker::CircuitBreaker;
use super::types::{CircuitBreakerConfig, CircuitBreakerStats};

/// Lazily creates and hands out exactly one breaker per source name
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    default_config: CircuitBreakerConfig,
}

impl CircuitBreakerRegistry {
    /// Create a new registry with default config
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    /// Create a registry with custom default config
    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: DashMap::new(),
            default_config: config,
        }
    }

    /// Get or create the breaker for a source
    pub fn get(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            return existing.clone();
        }
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::with_config(
                    name,
                    self.default_config.clone(),
                ))
            })
            .clone()
    }

    /// Get or create with a config that only applies on first creation
    pub fn get_with_config(&self, name: &str, config: CircuitBreakerConfig) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::with_config(name, config)))
            .clone()
    }

    /// Names of all breakers created so far
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.breakers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Stats for every breaker, sorted by name
    pub fn all_stats(&self) -> Vec<(String, CircuitBreakerStats)> {
        let mut results: Vec<_> = self
            .breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().stats()))
            .collect();
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
