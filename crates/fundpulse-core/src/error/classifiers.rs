//! Error classification helpers

use super::types::PulseError;

impl PulseError {
    /// Whether this error represents caller cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the call was rejected by admission control without running
    pub fn is_capacity_rejection(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }

    /// Whether a caller layered above the core could sensibly retry.
    ///
    /// The core itself never retries across call boundaries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status_code, .. } => match status_code {
                Some(code) => *code == 429 || *code >= 500,
                None => true,
            },
            Self::Timeout { .. } | Self::CircuitOpen { .. } => true,
            Self::Llm { .. } => true,
            _ => false,
        }
    }

    /// Short machine-readable code, used in logs and outbound error events
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Llm { .. } => "llm",
            Self::Http { .. } => "http",
            Self::CircuitOpen { .. } => "circuit_open",
            Self::Cache { .. } => "cache",
            Self::Json { .. } => "json",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
            Self::ResearchTruncated { .. } => "research_truncated",
            Self::Other { .. } => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_retry_classification() {
        assert!(PulseError::http_status("http://x", 503).is_retryable());
        assert!(PulseError::http_status("http://x", 429).is_retryable());
        assert!(!PulseError::http_status("http://x", 404).is_retryable());
        assert!(!PulseError::Cancelled.is_retryable());
    }

    #[test]
    fn test_codes_and_flags() {
        let open = PulseError::circuit_open("news");
        assert!(open.is_capacity_rejection());
        assert_eq!(open.code(), "circuit_open");
        assert_eq!(open.to_string(), "Circuit open for source 'news'");
        assert!(PulseError::Cancelled.is_cancelled());
        assert_eq!(PulseError::ResearchTruncated { rounds: 3 }.code(), "research_truncated");
    }
}
