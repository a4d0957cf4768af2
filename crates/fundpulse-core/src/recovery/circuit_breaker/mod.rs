//! Circuit breaker pattern for per-source fault isolation
//!
//! A failing upstream is cut off for a cooldown period so callers fail fast
//! instead of piling up on a dead dependency.

mod breaker;
mod registry;
mod types;


pub use breaker::CircuitBreaker;
pub use registry::CircuitBreakerRegistry;
pub use types::{CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerStats, CircuitState};
