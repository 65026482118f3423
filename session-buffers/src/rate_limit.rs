use std::fmt::Debug;
use std::thread;
use std::time::Duration;

/// Throughput shaping hooks invoked around every insert.
///
/// Both hooks may block the inserting thread for as long as they like. Buffers
/// never call them while holding their own lock, so a slow limiter cannot
/// stall the consumer.
pub trait RateLimiter: Send + Sync + Debug {
    /// Called before the insert with the number of elements already queued.
    fn pre_insert(&self, _size: usize) {}

    /// Called after a successful insert with the new number of queued
    /// elements.
    fn post_insert(&self, _size: usize) {}
}

/// A limiter that never delays anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRateLimiter;

impl RateLimiter for NullRateLimiter {}

/// Slows producers down quadratically once a queue starts to back up.
///
/// Above a cutoff of 5% of the queue capacity, each insert sleeps
/// `(size / 100)^2` milliseconds:
///
/// | queued    | delay  |
/// |-----------|--------|
/// | 0-99      | 0 ms   |
/// | 100-199   | 1 ms   |
/// | 200-299   | 4 ms   |
/// | 1000-1099 | 100 ms |
#[derive(Debug, Clone, Copy)]
pub struct ExponentialRateLimiter {
    cutoff: usize,
}

impl ExponentialRateLimiter {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            cutoff: queue_capacity / 20,
        }
    }

    pub fn cutoff(&self) -> usize {
        self.cutoff
    }

    /// The delay `pre_insert` applies for a queue holding `size` elements.
    pub fn delay_for(&self, size: usize) -> Duration {
        if size <= self.cutoff {
            return Duration::ZERO;
        }
        let hundreds = (size / 100) as u64;
        Duration::from_millis(hundreds.saturating_mul(hundreds))
    }
}

impl RateLimiter for ExponentialRateLimiter {
    fn pre_insert(&self, size: usize) {
        let delay = self.delay_for(size);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}
