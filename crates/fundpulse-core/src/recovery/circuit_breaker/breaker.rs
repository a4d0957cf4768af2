//! Circuit breaker implementation

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::time::Instant;

use super::types::{CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerStats, CircuitState};

/// Mutable breaker state, only touched under the breaker's lock
#[derive(Debug)]
struct BreakerCore {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
    total_calls: u64,
    total_failures: u64,
    rejected_calls: u64,
    last_transition: Option<DateTime<Utc>>,
}

/// How a call was let through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Normal,
    Trial,
}

/// Circuit breaker guarding one upstream source.
///
/// State is only changed from inside [`CircuitBreaker::call`]; the lock is
/// never held while the operation runs.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    core: Mutex<BreakerCore>,
}

/// Releases the half-open trial slot if the trial future is dropped
/// before it produced a verdict.
struct TrialGuard<'a> {
    breaker: &'a CircuitBreaker,
    armed: bool,
}

impl Drop for TrialGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut core = self.breaker.core.lock();
            core.trial_in_flight = false;
            tracing::debug!(source = %self.breaker.name, "Half-open trial abandoned");
        }
    }
}

impl CircuitBreaker {
    /// Create a new circuit breaker with default config
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, CircuitBreakerConfig::default())
    }

    /// Create a new circuit breaker with custom config
    pub fn with_config(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            core: Mutex::new(BreakerCore {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                opened_at: None,
                trial_in_flight: false,
                total_calls: 0,
                total_failures: 0,
                rejected_calls: 0,
                last_transition: None,
            }),
        }
    }

    /// Source name this breaker guards
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Last recorded state. An expired Open state is only moved to HalfOpen
    /// by the next call.
    pub fn state(&self) -> CircuitState {
        self.core.lock().state
    }

    /// Execute an operation with circuit breaker protection
    pub async fn call<T, E, F, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let admission = self.admit()?;
        let mut guard = TrialGuard {
            breaker: self,
            armed: admission == Admission::Trial,
        };

        let result = operation().await;
        guard.armed = false;

        match result {
            Ok(value) => {
                self.record_success(admission);
                Ok(value)
            }
            Err(e) => {
                self.record_failure(admission);
                Err(CircuitBreakerError::OperationFailed(e))
            }
        }
    }

    /// Snapshot of the breaker's counters
    pub fn stats(&self) -> CircuitBreakerStats {
        let core = self.core.lock();
        CircuitBreakerStats {
            state: core.state,
            failure_count: core.failure_count,
            success_count: core.success_count,
            total_calls: core.total_calls,
            total_failures: core.total_failures,
            rejected_calls: core.rejected_calls,
            last_transition: core.last_transition,
        }
    }

    fn admit<E>(&self) -> Result<Admission, CircuitBreakerError<E>> {
        let mut core = self.core.lock();
        match core.state {
            CircuitState::Closed => Ok(Admission::Normal),
            CircuitState::Open => {
                let cooled_down = core
                    .opened_at
                    .is_none_or(|at| at.elapsed() >= self.config.open_duration);
                if cooled_down {
                    self.transition(&mut core, CircuitState::HalfOpen);
                    core.trial_in_flight = true;
                    Ok(Admission::Trial)
                } else {
                    core.rejected_calls += 1;
                    Err(self.rejection())
                }
            }
            CircuitState::HalfOpen => {
                if core.trial_in_flight {
                    core.rejected_calls += 1;
                    Err(self.rejection())
                } else {
                    core.trial_in_flight = true;
                    Ok(Admission::Trial)
                }
            }
        }
    }

    fn record_success(&self, admission: Admission) {
        let mut core = self.core.lock();
        core.total_calls += 1;

        match (core.state, admission) {
            (CircuitState::Closed, _) => core.failure_count = 0,
            (CircuitState::HalfOpen, Admission::Trial) => {
                core.trial_in_flight = false;
                core.success_count += 1;
                if core.success_count >= self.config.half_open_success_threshold {
                    self.transition(&mut core, CircuitState::Closed);
                }
            }
            // Verdicts from calls admitted before the circuit opened do not
            // count toward recovery
            _ => {}
        }
    }

    fn record_failure(&self, admission: Admission) {
        let mut core = self.core.lock();
        core.total_calls += 1;
        core.total_failures += 1;

        match (core.state, admission) {
            (CircuitState::Closed, _) => {
                core.failure_count += 1;
                if core.failure_count >= self.config.failure_threshold {
                    self.transition(&mut core, CircuitState::Open);
                }
            }
            (CircuitState::HalfOpen, Admission::Trial) => {
                core.trial_in_flight = false;
                core.failure_count += 1;
                self.transition(&mut core, CircuitState::Open);
            }
            _ => {}
        }
    }

    fn transition(&self, core: &mut BreakerCore, to: CircuitState) {
        let from = core.state;
        core.state = to;
        core.last_transition = Some(Utc::now());

        match to {
            CircuitState::Open => {
                core.opened_at = Some(Instant::now());
                core.success_count = 0;
                tracing::warn!(
                    source = %self.name,
                    %from,
                    failures = core.failure_count,
                    "Circuit breaker opened"
                );
            }
            CircuitState::HalfOpen => {
                core.success_count = 0;
                tracing::info!(source = %self.name, "Circuit breaker half-open, admitting trial");
            }
            CircuitState::Closed => {
                core.failure_count = 0;
                core.success_count = 0;
                core.opened_at = None;
                tracing::info!(source = %self.name, "Circuit breaker closed");
            }
        }
    }

    fn rejection<E>(&self) -> CircuitBreakerError<E> {
        CircuitBreakerError::Open {
            source_name: self.name.clone(),
        }
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}
