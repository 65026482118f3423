use crate::error::BufferError;
use crate::rate_limit::{ExponentialRateLimiter, NullRateLimiter, RateLimiter};
use crate::round_robin::Weights;
use crate::sequence::{INITIAL_SEQUENCE_NUMBER, SequenceNumber};
use std::sync::Arc;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// What a producer experiences when it inserts into a full queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertMode {
    /// Wait until the consumer frees a slot.
    #[default]
    Blocking,
    /// Reject the element immediately.
    NonBlocking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateLimitPolicy {
    #[default]
    None,
    /// See [`ExponentialRateLimiter`].
    Exponential,
}

/// Tunables for the outbound queues of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferConfig {
    /// Capacity of the message queue (per sub-queue for round-robin queues).
    pub capacity: usize,
    pub insert_mode: InsertMode,
    pub rate_limit: RateLimitPolicy,
    /// First sequence number stamped by a history buffer.
    pub initial_sequence_number: SequenceNumber,
    /// Retained history; `None` matches the source queue capacity.
    pub history_capacity: Option<usize>,
    /// Polls per cycle for each sub-queue of a round-robin queue.
    pub round_robin_weights: Weights,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            insert_mode: InsertMode::default(),
            rate_limit: RateLimitPolicy::default(),
            initial_sequence_number: INITIAL_SEQUENCE_NUMBER,
            history_capacity: None,
            round_robin_weights: Weights::default(),
        }
    }
}

impl BufferConfig {
    pub fn validate(&self) -> Result<(), BufferError> {
        if self.capacity == 0 || self.history_capacity == Some(0) {
            return Err(BufferError::ZeroCapacity);
        }
        if !self.initial_sequence_number.is_valid() {
            return Err(BufferError::InvalidSequenceNumber(
                self.initial_sequence_number.get(),
            ));
        }
        self.round_robin_weights.validate()
    }

    /// Builds the limiter selected by `rate_limit`, scaled to `capacity`.
    pub fn rate_limiter(&self) -> Arc<dyn RateLimiter> {
        match self.rate_limit {
            RateLimitPolicy::None => Arc::new(NullRateLimiter),
            RateLimitPolicy::Exponential => Arc::new(ExponentialRateLimiter::new(self.capacity)),
        }
    }
}
