//! Tests for the keyed rate limiter

use super::limiter::KeyedRateLimiter;
use super::types::RateLimitPolicy;
use std::sync::Arc;
use std::time::Duration;

fn policy(capacity: f64, refill_per_sec: f64) -> RateLimitPolicy {
    RateLimitPolicy {
        capacity,
        refill_per_sec,
        idle_ttl_secs: 60,
    }
}

#[tokio::test(start_paused = true)]
async fn test_burst_never_exceeds_capacity() {
    let limiter = KeyedRateLimiter::new("test", policy(5.0, 1.0));

    for _ in 0..5 {
        assert!(limiter.allow("10.0.0.1"));
    }
    assert!(!limiter.allow("10.0.0.1"));
}

#[tokio::test(start_paused = true)]
async fn test_refill_is_lazy_and_capped() {
    let limiter = KeyedRateLimiter::new("test", policy(2.0, 10.0));

    assert!(limiter.allow("k"));
    assert!(limiter.allow("k"));
    assert!(!limiter.allow("k"));

    tokio::time::advance(Duration::from_millis(100)).await;
    assert!(limiter.allow("k"));
    assert!(!limiter.allow("k"));

    tokio::time::advance(Duration::from_secs(60)).await;
    assert_eq!(limiter.available("k"), 2.0);
}

#[tokio::test(start_paused = true)]
async fn test_sustained_rate_is_never_denied() {
    let limiter = KeyedRateLimiter::new("test", policy(1.0, 2.0));

    for _ in 0..20 {
        assert!(limiter.allow("steady"));
        tokio::time::advance(Duration::from_millis(500)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_keys_are_independent() {
    let limiter = KeyedRateLimiter::new("test", policy(1.0, 0.1));

    assert!(limiter.allow("alice"));
    assert!(!limiter.allow("alice"));
    assert!(limiter.allow("bob"));
    assert_eq!(limiter.tracked_keys(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_strict_policy_allows_ten_per_minute() {
    let limiter = KeyedRateLimiter::new("ai", RateLimitPolicy::strict());

    for _ in 0..10 {
        assert!(limiter.allow("user-1"));
    }
    assert!(!limiter.allow("user-1"));

    tokio::time::advance(Duration::from_secs(6)).await;
    assert!(limiter.allow("user-1"));
}

#[tokio::test(start_paused = true)]
async fn test_sweep_evicts_idle_buckets() {
    let limiter = KeyedRateLimiter::new("test", policy(3.0, 1.0));
    limiter.allow("idle");
    tokio::time::advance(Duration::from_secs(30)).await;
    limiter.allow("active");

    tokio::time::advance(Duration::from_secs(31)).await;
    assert_eq!(limiter.sweep(), 1);
    assert_eq!(limiter.tracked_keys(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_background_sweeper_runs_and_stops() {
    let limiter = Arc::new(KeyedRateLimiter::new("test", policy(3.0, 1.0)));
    limiter.allow("a");
    limiter.start_sweeper(Duration::from_secs(10));
    assert!(limiter.is_sweeping());

    // Past the idle TTL plus one sweep interval
    for _ in 0..8 {
        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
    }
    assert_eq!(limiter.tracked_keys(), 0);

    limiter.stop();
    limiter.stop();
    assert!(!limiter.is_sweeping());
}
