use crate::config::{BufferConfig, InsertMode};
use crate::error::BufferError;
use crate::monitor::{Monitor, MonitorState};
use crate::queue::{BoundedQueue, BufferReader};
use crate::rate_limit::RateLimiter;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Classifies elements into the primary or the alternate stream.
pub trait QueueAlternator<T>: Send + Sync {
    fn put_in_alternate_queue(&self, element: &T) -> bool;
}

impl<T, F> QueueAlternator<T> for F
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn put_in_alternate_queue(&self, element: &T) -> bool {
        self(element)
    }
}

/// Which sub-queue the next `poll` tries first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Turn {
    #[default]
    PrimaryPreferred,
    AlternatePreferred,
}

/// How many polls each sub-queue gets per cycle when both have elements.
///
/// The first `2 * min(primary, alternate)` slots of a cycle alternate between
/// the sub-queues, starting with the primary one; the remaining slots go to
/// the sub-queue with the larger weight. `2:1` therefore serves
/// `primary, alternate, primary` and then starts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weights {
    pub primary: usize,
    pub alternate: usize,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            primary: 1,
            alternate: 1,
        }
    }
}

impl Weights {
    pub fn validate(&self) -> Result<(), BufferError> {
        if self.primary == 0 || self.alternate == 0 {
            return Err(BufferError::ZeroWeight);
        }
        Ok(())
    }

    fn cycle_len(&self) -> usize {
        self.primary + self.alternate
    }

    fn turn_at(&self, slot: usize) -> Turn {
        if slot < 2 * self.primary.min(self.alternate) {
            if slot % 2 == 0 {
                Turn::PrimaryPreferred
            } else {
                Turn::AlternatePreferred
            }
        } else if self.primary > self.alternate {
            Turn::PrimaryPreferred
        } else {
            Turn::AlternatePreferred
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lane {
    Primary,
    Alternate,
}

#[derive(Debug)]
struct RoundRobinState<T> {
    primary: VecDeque<T>,
    alternate: VecDeque<T>,
    weights: Weights,
    /// Position in the current weighting cycle; advances on every successful
    /// poll.
    slot: usize,
    interrupted: bool,
}

impl<T> RoundRobinState<T> {
    fn queue(&self, lane: Lane) -> &VecDeque<T> {
        match lane {
            Lane::Primary => &self.primary,
            Lane::Alternate => &self.alternate,
        }
    }

    fn queue_mut(&mut self, lane: Lane) -> &mut VecDeque<T> {
        match lane {
            Lane::Primary => &mut self.primary,
            Lane::Alternate => &mut self.alternate,
        }
    }

    fn turn(&self) -> Turn {
        self.weights.turn_at(self.slot)
    }

    /// The preferred lane for this slot, unless it is empty.
    fn select(&self) -> Lane {
        let (preferred, fallback) = match self.turn() {
            Turn::PrimaryPreferred => (Lane::Primary, Lane::Alternate),
            Turn::AlternatePreferred => (Lane::Alternate, Lane::Primary),
        };
        if self.queue(preferred).is_empty() {
            fallback
        } else {
            preferred
        }
    }

    fn take(&mut self) -> Option<T> {
        let lane = self.select();
        let element = self.queue_mut(lane).pop_front()?;
        self.slot = (self.slot + 1) % self.weights.cycle_len();
        Some(element)
    }
}

impl<T: Clone> RoundRobinState<T> {
    fn front(&self) -> Option<T> {
        self.queue(self.select()).front().cloned()
    }
}

impl<T> MonitorState for RoundRobinState<T> {
    fn is_drained(&self) -> bool {
        self.primary.is_empty() && self.alternate.is_empty()
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    fn set_interrupted(&mut self, interrupted: bool) {
        self.interrupted = interrupted;
    }
}

/// Interleaves two independently bounded FIFO streams so that neither starves.
///
/// Consumption alternates between the primary and the alternate sub-queue,
/// starting with the primary one, in the proportion set by [`Weights`]
/// (strict alternation by default). When the preferred sub-queue is empty the
/// other one is served instead. Both sub-queues live behind one lock, so a
/// waiting consumer wakes on an insert into either.
pub struct RoundRobinBuffer<T> {
    capacity: usize,
    insert_mode: InsertMode,
    limiter: Arc<dyn RateLimiter>,
    alternator: Box<dyn QueueAlternator<T>>,
    monitor: Monitor<RoundRobinState<T>>,
}

impl<T: Clone + Send> RoundRobinBuffer<T> {
    /// A blocking round-robin queue bounding each sub-queue to `capacity`.
    pub fn new(
        capacity: usize,
        limiter: Arc<dyn RateLimiter>,
        alternator: impl QueueAlternator<T> + 'static,
    ) -> Result<Self, BufferError> {
        Self::with_insert_mode(capacity, limiter, alternator, InsertMode::Blocking)
    }

    pub fn with_insert_mode(
        capacity: usize,
        limiter: Arc<dyn RateLimiter>,
        alternator: impl QueueAlternator<T> + 'static,
        insert_mode: InsertMode,
    ) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            insert_mode,
            limiter,
            alternator: Box::new(alternator),
            monitor: Monitor::new(RoundRobinState {
                primary: VecDeque::new(),
                alternate: VecDeque::new(),
                weights: Weights::default(),
                slot: 0,
                interrupted: false,
            }),
        })
    }

    /// Replaces the 1:1 alternation with `weights` and restarts the cycle.
    pub fn with_weights(self, weights: Weights) -> Result<Self, BufferError> {
        weights.validate()?;
        {
            let mut state = self.monitor.lock();
            state.weights = weights;
            state.slot = 0;
        }
        Ok(self)
    }

    pub fn from_config(
        config: &BufferConfig,
        alternator: impl QueueAlternator<T> + 'static,
    ) -> Result<Self, BufferError> {
        config.validate()?;
        Self::with_insert_mode(
            config.capacity,
            config.rate_limiter(),
            alternator,
            config.insert_mode,
        )?
        .with_weights(config.round_robin_weights)
    }

    pub fn primary_len(&self) -> usize {
        self.monitor.lock().primary.len()
    }

    pub fn alternate_len(&self) -> usize {
        self.monitor.lock().alternate.len()
    }

    pub fn weights(&self) -> Weights {
        self.monitor.lock().weights
    }

    pub fn turn(&self) -> Turn {
        self.monitor.lock().turn()
    }
}

impl<T> fmt::Debug for RoundRobinBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.monitor.lock();
        f.debug_struct("RoundRobinBuffer")
            .field("capacity", &self.capacity)
            .field("insert_mode", &self.insert_mode)
            .field("limiter", &self.limiter)
            .field("primary_len", &state.primary.len())
            .field("alternate_len", &state.alternate.len())
            .field("weights", &state.weights)
            .field("slot", &state.slot)
            .field("interrupted", &state.interrupted)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Send> BufferReader<T> for RoundRobinBuffer<T> {
    fn poll(&self) -> Option<T> {
        let element = self.monitor.lock().take();
        if element.is_some() {
            self.monitor.notify();
        }
        element
    }

    fn peek(&self) -> Option<T> {
        self.monitor.lock().front()
    }

    fn wait_and_poll(&self) -> Result<T, BufferError> {
        self.monitor.wait_for_element(RoundRobinState::take)
    }

    fn wait_and_peek(&self) -> Result<T, BufferError> {
        self.monitor.wait_for_element(|state| state.front())
    }

    fn wait_and_poll_timeout(&self, timeout: Duration) -> Result<Option<T>, BufferError> {
        self.monitor.wait_for_element_until(Instant::now() + timeout, RoundRobinState::take)
    }

    fn wait_until_empty(&self, timeout: Duration) -> bool {
        self.monitor.wait_until_drained(timeout)
    }

    /// Polls needed to drain the fuller sub-queue, not the total element count.
    fn len(&self) -> usize {
        let state = self.monitor.lock();
        state.primary.len().max(state.alternate.len())
    }

    /// Capacity of each sub-queue.
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn interrupt(&self, interrupt: bool) {
        debug!("Round robin buffer interrupt set to {}", interrupt);
        self.monitor.interrupt(interrupt);
    }
}

impl<T: Clone + Send> BoundedQueue<T> for RoundRobinBuffer<T> {
    fn insert(&self, element: T) -> bool {
        let lane = if self.alternator.put_in_alternate_queue(&element) {
            Lane::Alternate
        } else {
            Lane::Primary
        };

        let size = self.monitor.lock().queue(lane).len();
        self.limiter.pre_insert(size);

        let mut state = self.monitor.lock();
        while state.queue(lane).len() >= self.capacity {
            match self.insert_mode {
                InsertMode::NonBlocking => {
                    debug!("Rejected insert into full {:?} sub-queue", lane);
                    return false;
                }
                InsertMode::Blocking => {
                    if state.interrupted {
                        debug!("Blocked insert into {:?} sub-queue interrupted", lane);
                        return false;
                    }
                    self.monitor.wait(&mut state);
                }
            }
        }
        let queue = state.queue_mut(lane);
        queue.push_back(element);
        let new_size = queue.len();
        drop(state);
        self.monitor.notify();

        self.limiter.post_insert(new_size);
        true
    }
}
