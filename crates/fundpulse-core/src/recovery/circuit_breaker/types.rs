//! Circuit breaker types and configuration

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through and failures are counted
    Closed,
    /// Calls are rejected until the open duration elapses
    Open,
    /// One trial call at a time probes whether the source recovered
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures in Closed before the circuit opens
    pub failure_threshold: u32,
    /// How long the circuit stays open before admitting a trial
    pub open_duration: Duration,
    /// Successful trials needed in HalfOpen to close again
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
            half_open_success_threshold: 2,
        }
    }
}

impl CircuitBreakerConfig {
    /// Trip early and probe sooner, for cheap sources
    pub fn aggressive() -> Self {
        Self {
            failure_threshold: 3,
            open_duration: Duration::from_secs(15),
            half_open_success_threshold: 1,
        }
    }

    /// Tolerate flaky sources for longer
    pub fn lenient() -> Self {
        Self {
            failure_threshold: 10,
            open_duration: Duration::from_secs(60),
            half_open_success_threshold: 3,
        }
    }
}

/// Error from circuit breaker operations
#[derive(Debug)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open; the operation was not invoked
    Open { source_name: String },
    /// Operation ran and failed
    OperationFailed(E),
}

impl<E> CircuitBreakerError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }
}

impl<E: std::fmt::Display> std::fmt::Display for CircuitBreakerError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { source_name } => {
                write!(f, "Circuit breaker open for source: {}", source_name)
            }
            Self::OperationFailed(e) => write!(f, "Operation failed: {}", e),
        }
    }
}

impl<E: std::error::Error> std::error::Error for CircuitBreakerError<E> {}

/// Point-in-time snapshot of a breaker
#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    pub total_calls: u64,
    pub total_failures: u64,
    /// Calls rejected without invoking the operation
    pub rejected_calls: u64,
    pub last_transition: Option<DateTime<Utc>>,
}

impl CircuitBreakerStats {
    /// Failure rate of executed calls as a percentage
    pub fn failure_rate(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            (self.total_failures as f64 / self.total_calls as f64) * 100.0
        }
    }
}
