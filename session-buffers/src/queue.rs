use crate::error::BufferError;
use std::time::Duration;

/// The consumer side of a buffer.
///
/// Every buffer in this crate implements it. Blocking operations return
/// [`BufferError::Interrupted`] once [`BufferReader::interrupt`] has been
/// raised and nothing is available.
pub trait BufferReader<T>: Send + Sync {
    /// Removes and returns the next element, if any.
    fn poll(&self) -> Option<T>;

    /// Returns a copy of the element `poll` would return, without consuming it.
    fn peek(&self) -> Option<T>;

    /// Blocks until an element is available, then behaves like `poll`.
    fn wait_and_poll(&self) -> Result<T, BufferError>;

    /// Blocks until an element is available, then behaves like `peek`.
    fn wait_and_peek(&self) -> Result<T, BufferError>;

    /// Blocks for at most `timeout` until an element is available, then
    /// behaves like `poll`. Returns `Ok(None)` if the timeout expires first.
    fn wait_and_poll_timeout(&self, timeout: Duration) -> Result<Option<T>, BufferError>;

    /// Blocks until the buffer has been drained.
    ///
    /// A zero `timeout` waits indefinitely. Returns whether the buffer was
    /// empty when the wait ended.
    fn wait_until_empty(&self, timeout: Duration) -> bool;

    /// Number of unread elements.
    fn len(&self) -> usize;

    fn capacity(&self) -> usize;

    /// Raises or clears the interrupt flag, waking every blocked thread.
    fn interrupt(&self, interrupt: bool);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }
}

/// A bounded queue that producers can insert into.
pub trait BoundedQueue<T>: BufferReader<T> {
    /// Inserts an element, returning `false` if it was rejected.
    fn insert(&self, element: T) -> bool;
}

/// Selects the rewind target in [`crate::CircularBuffer::rewind_to`].
pub trait ElementFinder<T> {
    fn matches(&mut self, element: &T) -> bool;
}

impl<T, F> ElementFinder<T> for F
where
    F: FnMut(&T) -> bool,
{
    fn matches(&mut self, element: &T) -> bool {
        self(element)
    }
}
