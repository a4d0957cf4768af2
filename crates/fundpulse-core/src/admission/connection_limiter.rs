//! Bounded pool of concurrent streaming (SSE) slots

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

#[derive(Debug)]
struct SlotPool {
    available: AtomicUsize,
    capacity: usize,
}

impl SlotPool {
    fn release(&self) {
        // Capped at capacity so a stray release can never grow the pool
        let _ = self
            .available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.capacity).then_some(n + 1)
            });
    }
}

/// Limits concurrent streaming sessions to a fixed number of slots.
///
/// Acquisition never waits: when the pool is empty the caller is expected
/// to reject the request.
#[derive(Debug, Clone)]
pub struct ConnectionLimiter {
    pool: Arc<SlotPool>,
}

/// A held streaming slot, released when dropped
#[derive(Debug)]
pub struct SsePermit {
    pool: Arc<SlotPool>,
}

impl ConnectionLimiter {
    pub fn new(capacity: usize) -> Self {
        Self {
            pool: Arc::new(SlotPool {
                available: AtomicUsize::new(capacity),
                capacity,
            }),
        }
    }

    /// Take a slot if one is free
    pub fn acquire(&self) -> Option<SsePermit> {
        let taken = self
            .pool
            .available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();

        if taken {
            Some(SsePermit {
                pool: self.pool.clone(),
            })
        } else {
            debug!(capacity = self.pool.capacity, "No free streaming slot");
            None
        }
    }

    pub fn available(&self) -> usize {
        self.pool.available.load(Ordering::Acquire)
    }

    pub fn in_use(&self) -> usize {
        self.pool.capacity - self.available()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity
    }
}

impl SsePermit {
    /// Give the slot back now instead of at end of scope
    pub fn release(self) {}
}

impl Drop for SsePermit {
    fn drop(&mut self) {
        self.pool.release();
    }
}
