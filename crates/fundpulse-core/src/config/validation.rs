//! Configuration validation

use super::model::PulseConfig;
use crate::error::{PulseError, PulseResult};

impl PulseConfig {
    /// Reject values that would make a component unusable.
    ///
    /// Missing LLM credentials are not checked here; the LLM client reports
    /// them per call so the rest of the system can run without a provider.
    pub fn validate(&self) -> PulseResult<()> {
        if self.breaker.failure_threshold == 0 {
            return Err(invalid("breaker.failure_threshold must be at least 1"));
        }
        if self.breaker.half_open_success_threshold == 0 {
            return Err(invalid(
                "breaker.half_open_success_threshold must be at least 1",
            ));
        }
        for (name, policy) in [
            ("general", &self.rate_limit.general),
            ("strict", &self.rate_limit.strict),
        ] {
            if policy.capacity < 1.0 || policy.refill_per_sec <= 0.0 {
                return Err(invalid(format!(
                    "rate_limit.{} needs capacity >= 1 and a positive refill rate",
                    name
                )));
            }
        }
        if self.sse.max_connections == 0 {
            return Err(invalid("sse.max_connections must be at least 1"));
        }
        // One slot is held back for the terminal event
        if self.orchestrator.queue_capacity < 2 {
            return Err(invalid("orchestrator.queue_capacity must be at least 2"));
        }
        if self.orchestrator.max_research_rounds == 0 {
            return Err(invalid("orchestrator.max_research_rounds must be at least 1"));
        }
        if self.http.timeout_secs == 0 {
            return Err(invalid("http.timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> PulseError {
    PulseError::config_with_context(message, "Validating configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PulseConfig::default().validate().is_ok());
    }

    #[test]
    fn test_queue_needs_room_beside_terminal_slot() {
        let mut config = PulseConfig::default();
        config.orchestrator.queue_capacity = 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("queue_capacity"));
    }
}
