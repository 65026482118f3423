use crate::error::BufferError;
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

/// Identifier stamped on every outbound message, used both for ordering and as
/// the resumption point exchanged with the peer.
///
/// Valid numbers occupy `0..=i32::MAX`. Incrementing past the maximum wraps to
/// [`INITIAL_SEQUENCE_NUMBER`], so a valid number is never negative. The only
/// negative value with a meaning is [`NO_SEQUENCE_NUMBER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SequenceNumber(pub i32);

/// Sentinel meaning "no sequence number", e.g. for an empty history.
pub const NO_SEQUENCE_NUMBER: SequenceNumber = SequenceNumber(i32::MIN);
/// The first number ever assigned in a session.
pub const INITIAL_SEQUENCE_NUMBER: SequenceNumber = SequenceNumber(0);
/// The highest valid number; its successor is [`INITIAL_SEQUENCE_NUMBER`].
pub const MAX_SEQUENCE_NUMBER: SequenceNumber = SequenceNumber(i32::MAX);

impl From<i32> for SequenceNumber {
    fn from(val: i32) -> Self {
        SequenceNumber(val)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SequenceNumber {
    pub fn get(self) -> i32 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }

    /// Returns the successor of this number.
    ///
    /// `MAX_SEQUENCE_NUMBER` wraps to `INITIAL_SEQUENCE_NUMBER`, and any invalid
    /// (negative) value advances straight to `INITIAL_SEQUENCE_NUMBER`.
    #[must_use]
    pub fn next(self) -> Self {
        SequenceNumber(self.0.wrapping_add(1).max(INITIAL_SEQUENCE_NUMBER.0))
    }

    /// Adds two numbers, wrapping the result back into the valid range by
    /// clearing the sign bit.
    #[must_use]
    pub fn wrapping_sum(self, other: SequenceNumber) -> Self {
        SequenceNumber(self.0.wrapping_add(other.0) & i32::MAX)
    }

    /// Returns whether `self` lies in the window `oldest..=newest`.
    ///
    /// When `oldest > newest` the window is taken to have wrapped past
    /// `MAX_SEQUENCE_NUMBER`.
    pub fn in_interval(
        self,
        oldest: SequenceNumber,
        newest: SequenceNumber,
    ) -> Result<bool, BufferError> {
        for value in [oldest, self, newest] {
            if !value.is_valid() {
                return Err(BufferError::InvalidSequenceNumber(value.0));
            }
        }
        if oldest <= newest {
            Ok(oldest <= self && self <= newest)
        } else {
            Ok(self <= newest || oldest <= self)
        }
    }
}

/// A sequence counter that can be shared between threads without a lock.
#[derive(Debug)]
pub struct AtomicSequenceNumber {
    value: AtomicI32,
}

impl Default for AtomicSequenceNumber {
    fn default() -> Self {
        Self::new(INITIAL_SEQUENCE_NUMBER)
    }
}

impl AtomicSequenceNumber {
    pub fn new(initial: SequenceNumber) -> Self {
        Self {
            value: AtomicI32::new(initial.0),
        }
    }

    pub fn get(&self) -> SequenceNumber {
        SequenceNumber(self.value.load(Ordering::SeqCst))
    }

    pub fn set(&self, value: SequenceNumber) {
        self.value.store(value.0, Ordering::SeqCst);
    }

    pub fn get_and_set(&self, value: SequenceNumber) -> SequenceNumber {
        SequenceNumber(self.value.swap(value.0, Ordering::SeqCst))
    }

    /// Returns the current number and advances the counter to its successor.
    pub fn get_and_increment(&self) -> SequenceNumber {
        let mut current = self.value.load(Ordering::Relaxed);
        loop {
            let next = SequenceNumber(current).next().0;
            match self.value.compare_exchange_weak(
                current,
                next,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(previous) => return SequenceNumber(previous),
                Err(actual) => current = actual,
            }
        }
    }

    pub fn increment_and_get(&self) -> SequenceNumber {
        self.get_and_increment().next()
    }
}
