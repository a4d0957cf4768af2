//! Keyed token-bucket rate limiting
//!
//! Each key (client address, user id) owns a bucket that refills lazily on
//! access. Idle buckets can be swept by a background task.

mod limiter;
mod types;

#[cfg(test)]
mod tests;

pub use limiter::KeyedRateLimiter;
pub use types::RateLimitPolicy;
