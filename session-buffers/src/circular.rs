use crate::error::BufferError;
use crate::monitor::{Monitor, MonitorState};
use crate::queue::{BoundedQueue, BufferReader, ElementFinder};
use std::time::{Duration, Instant};
use tracing::trace;

/// Slot storage and the two cursors of a [`CircularBuffer`].
///
/// `write` and `read` are absolute positions that only grow (except for
/// rewinds, which move `read` back). A position maps to slot
/// `position % capacity`. Invariant: `write - capacity <= read <= write`.
#[derive(Debug)]
struct Ring<T> {
    slots: Vec<Option<T>>,
    write: u64,
    read: u64,
    interrupted: bool,
}

impl<T> Ring<T> {
    fn capacity(&self) -> u64 {
        self.slots.len() as u64
    }

    fn slot(&self, position: u64) -> Option<&T> {
        self.slots[(position % self.capacity()) as usize].as_ref()
    }

    /// Position of the oldest element still physically retained.
    fn oldest(&self) -> u64 {
        self.write.saturating_sub(self.capacity())
    }

    fn unread(&self) -> usize {
        (self.write - self.read) as usize
    }

    fn push(&mut self, element: T) {
        let index = (self.write % self.capacity()) as usize;
        self.slots[index] = Some(element);
        self.write += 1;
        if self.write - self.read > self.capacity() {
            trace!(
                "Overwrote unread element at position {}",
                self.write - self.capacity() - 1
            );
            self.read = self.write - self.capacity();
        }
    }
}

impl<T: Clone> Ring<T> {
    fn front(&self) -> Option<T> {
        if self.read == self.write {
            return None;
        }
        self.slot(self.read).cloned()
    }

    fn take(&mut self) -> Option<T> {
        let element = self.front()?;
        self.read += 1;
        Some(element)
    }
}

impl<T> MonitorState for Ring<T> {
    fn is_drained(&self) -> bool {
        self.read == self.write
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    fn set_interrupted(&mut self, interrupted: bool) {
        self.interrupted = interrupted;
    }
}

/// A thread-safe ring buffer that keeps consumed elements around for replay.
///
/// Inserting never blocks and never fails: once the buffer is full, each new
/// element overwrites the oldest one, even if it has not been read yet. The
/// most recent `capacity` elements stay retained whether or not they have been
/// read, and the read cursor can be rewound anywhere into that consumed
/// history with [`rewind_to`](Self::rewind_to).
#[derive(Debug)]
pub struct CircularBuffer<T> {
    capacity: usize,
    monitor: Monitor<Ring<T>>,
}

impl<T: Clone + Send> CircularBuffer<T> {
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Ok(Self {
            capacity,
            monitor: Monitor::new(Ring {
                slots,
                write: 0,
                read: 0,
                interrupted: false,
            }),
        })
    }

    /// The oldest retained element, even if it has already been read.
    pub fn peek_oldest(&self) -> Option<T> {
        let ring = self.monitor.lock();
        if ring.write == 0 {
            return None;
        }
        ring.slot(ring.oldest()).cloned()
    }

    /// The most recently inserted element, even if it has already been read.
    pub fn peek_newest(&self) -> Option<T> {
        let ring = self.monitor.lock();
        if ring.write == 0 {
            return None;
        }
        ring.slot(ring.write - 1).cloned()
    }

    /// Number of consumed elements that are still retained and can be rewound
    /// to.
    pub fn available_history(&self) -> usize {
        let ring = self.monitor.lock();
        (ring.read - ring.oldest()) as usize
    }

    /// Copies the unread elements, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        let ring = self.monitor.lock();
        (ring.read..ring.write)
            .filter_map(|position| ring.slot(position).cloned())
            .collect()
    }

    /// Moves the read cursor back to the first retained element accepted by
    /// `finder`, so that it and everything after it will be read again.
    ///
    /// Only consumed elements are valid targets. Fails if the first match is
    /// unread, or if no retained element matches.
    pub fn rewind_to<F: ElementFinder<T>>(&self, mut finder: F) -> Result<(), BufferError> {
        let mut ring = self.monitor.lock();
        let found = (ring.oldest()..ring.write)
            .find(|&position| ring.slot(position).is_some_and(|e| finder.matches(e)));
        match found {
            Some(position) if position < ring.read => {
                ring.read = position;
                drop(ring);
                self.monitor.notify();
                Ok(())
            }
            _ => Err(BufferError::InvalidRewindTarget),
        }
    }

    /// Makes every retained element unread again.
    ///
    /// Fails once the buffer has been written past one full wrap, because the
    /// first element ever inserted is then gone.
    pub fn rewind_to_first(&self) -> Result<(), BufferError> {
        let mut ring = self.monitor.lock();
        if ring.write > ring.capacity() {
            return Err(BufferError::InvalidRewindTarget);
        }
        ring.read = ring.oldest();
        drop(ring);
        self.monitor.notify();
        Ok(())
    }

    /// Moves the read cursor back by `steps` consumed elements.
    pub fn rewind_by(&self, steps: usize) -> Result<(), BufferError> {
        let mut ring = self.monitor.lock();
        let steps = steps as u64;
        if steps > ring.read - ring.oldest() {
            return Err(BufferError::InvalidRewindTarget);
        }
        ring.read -= steps;
        drop(ring);
        self.monitor.notify();
        Ok(())
    }
}

impl<T: Clone + Send> BufferReader<T> for CircularBuffer<T> {
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
        self.monitor.wait_for_element(Ring::take)
    }

    fn wait_and_peek(&self) -> Result<T, BufferError> {
        self.monitor.wait_for_element(|ring| ring.front())
    }

    fn wait_and_poll_timeout(&self, timeout: Duration) -> Result<Option<T>, BufferError> {
        self.monitor.wait_for_element_until(Instant::now() + timeout, Ring::take)
    }

    fn wait_until_empty(&self, timeout: Duration) -> bool {
        self.monitor.wait_until_drained(timeout)
    }

    fn len(&self) -> usize {
        self.monitor.lock().unread()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn interrupt(&self, interrupt: bool) {
        self.monitor.interrupt(interrupt);
    }
}

impl<T: Clone + Send> BoundedQueue<T> for CircularBuffer<T> {
    fn insert(&self, element: T) -> bool {
        self.monitor.lock().push(element);
        self.monitor.notify();
        true
    }
}
