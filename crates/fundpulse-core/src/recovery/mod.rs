//! Failure isolation for upstream sources
//!
//! One circuit breaker per named source, handed out by a registry. The core
//! does not retry; callers layered above it decide whether to.

pub mod circuit_breaker;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerRegistry,
    CircuitBreakerStats, CircuitState,
};
