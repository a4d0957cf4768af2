//! Admission control for inbound requests
//!
//! Two independent primitives: a keyed token-bucket rate limiter and a
//! bounded pool of concurrent streaming slots. Both reject immediately
//! instead of queueing the caller.

pub mod connection_limiter;
pub mod rate_limiter;

pub use connection_limiter::{ConnectionLimiter, SsePermit};
pub use rate_limiter::{KeyedRateLimiter, RateLimitPolicy};
