use crate::config::{BufferConfig, InsertMode};
use crate::error::BufferError;
use crate::monitor::{Monitor, MonitorState};
use crate::queue::{BoundedQueue, BufferReader};
use crate::rate_limit::{NullRateLimiter, RateLimiter};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct QueueState<T> {
    data: VecDeque<T>,
    interrupted: bool,
}

impl<T> MonitorState for QueueState<T> {
    fn is_drained(&self) -> bool {
        self.data.is_empty()
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    fn set_interrupted(&mut self, interrupted: bool) {
        self.interrupted = interrupted;
    }
}

/// A bounded FIFO queue with pluggable throughput shaping.
///
/// Whether a full queue blocks or rejects producers is fixed at construction
/// by [`InsertMode`]. The [`RateLimiter`] hooks run outside the queue lock.
#[derive(Debug)]
pub struct RateLimitedBuffer<T> {
    capacity: usize,
    insert_mode: InsertMode,
    limiter: Arc<dyn RateLimiter>,
    monitor: Monitor<QueueState<T>>,
}

impl<T: Clone + Send> RateLimitedBuffer<T> {
    /// A blocking queue without rate limiting.
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        Self::with_limiter(capacity, Arc::new(NullRateLimiter), InsertMode::Blocking)
    }

    pub fn with_limiter(
        capacity: usize,
        limiter: Arc<dyn RateLimiter>,
        insert_mode: InsertMode,
    ) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            insert_mode,
            limiter,
            monitor: Monitor::new(QueueState {
                data: VecDeque::with_capacity(capacity),
                interrupted: false,
            }),
        })
    }

    pub fn from_config(config: &BufferConfig) -> Result<Self, BufferError> {
        config.validate()?;
        Self::with_limiter(config.capacity, config.rate_limiter(), config.insert_mode)
    }

    pub fn insert_mode(&self) -> InsertMode {
        self.insert_mode
    }
}

impl<T: Clone + Send> BufferReader<T> for RateLimitedBuffer<T> {
    fn poll(&self) -> Option<T> {
        let element = self.monitor.lock().data.pop_front();
        if element.is_some() {
            self.monitor.notify();
        }
        element
    }

    fn peek(&self) -> Option<T> {
        self.monitor.lock().data.front().cloned()
    }

    fn wait_and_poll(&self) -> Result<T, BufferError> {
        self.monitor.wait_for_element(|state| state.data.pop_front())
    }

    fn wait_and_peek(&self) -> Result<T, BufferError> {
        self.monitor.wait_for_element(|state| state.data.front().cloned())
    }

    fn wait_and_poll_timeout(&self, timeout: Duration) -> Result<Option<T>, BufferError> {
        let deadline = Instant::now() + timeout;
        self.monitor.wait_for_element_until(deadline, |state| state.data.pop_front())
    }

    fn wait_until_empty(&self, timeout: Duration) -> bool {
        self.monitor.wait_until_drained(timeout)
    }

    fn len(&self) -> usize {
        self.monitor.lock().data.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn interrupt(&self, interrupt: bool) {
        debug!("Rate limited buffer interrupt set to {}", interrupt);
        self.monitor.interrupt(interrupt);
    }
}

impl<T: Clone + Send> BoundedQueue<T> for RateLimitedBuffer<T> {
    fn insert(&self, element: T) -> bool {
        let size = self.len();
        self.limiter.pre_insert(size);

        let mut state = self.monitor.lock();
        while state.data.len() >= self.capacity {
            match self.insert_mode {
                InsertMode::NonBlocking => {
                    debug!("Rejected insert into full queue (capacity {})", self.capacity);
                    return false;
                }
                InsertMode::Blocking => {
                    if state.interrupted {
                        debug!("Blocked insert interrupted");
                        return false;
                    }
                    self.monitor.wait(&mut state);
                }
            }
        }
        state.data.push_back(element);
        let new_size = state.data.len();
        drop(state);
        self.monitor.notify();

        self.limiter.post_insert(new_size);
        true
    }
}
