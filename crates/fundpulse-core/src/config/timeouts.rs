//! Centralized timeout configuration
//!
//! This module provides default timeout values for the outbound calls the
//! core makes. All values can be overridden via configuration.

use std::time::Duration;

/// Default timeout values for crawled sources
pub mod network {
    use super::*;

    /// Fixed timeout for crawler HTTP requests (10 seconds)
    pub const HTTP_REQUEST_SECS: u64 = 10;

    /// Get crawler HTTP request timeout as Duration
    pub fn http_request_timeout() -> Duration {
        Duration::from_secs(HTTP_REQUEST_SECS)
    }
}

/// Default timeout values for LLM operations
pub mod llm {
    use super::*;

    /// Default connection timeout for LLM APIs (10 seconds)
    pub const CONNECTION_SECS: u64 = 10;

    /// Default timeout for a blocking completion (120 seconds)
    pub const REQUEST_SECS: u64 = 120;

    /// Longest silence tolerated between two reads of a stream (60 seconds)
    pub const STREAM_IDLE_SECS: u64 = 60;

    /// Get connection timeout as Duration
    pub fn connection_timeout() -> Duration {
        Duration::from_secs(CONNECTION_SECS)
    }

    /// Get request timeout as Duration
    pub fn request_timeout() -> Duration {
        Duration::from_secs(REQUEST_SECS)
    }
}

/// Default timeout values for the shared cache tier
pub mod cache {
    use super::*;

    /// Budget for the one-time startup probe of the shared cache (1.5 seconds)
    pub const CONNECT_MILLIS: u64 = 1_500;

    /// Get shared cache connect timeout as Duration
    pub fn connect_timeout() -> Duration {
        Duration::from_millis(CONNECT_MILLIS)
    }
}

/// Default timeout values for outbound event delivery
pub mod stream {
    use super::*;

    /// How long a worker waits for queue space before dropping an event
    pub const SEND_GRACE_MILLIS: u64 = 5_000;

    /// Get send grace period as Duration
    pub fn send_grace() -> Duration {
        Duration::from_millis(SEND_GRACE_MILLIS)
    }
}
