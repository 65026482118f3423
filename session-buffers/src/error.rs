use thiserror::Error;

/// Errors that can occur in the session buffer layer.
///
/// None of these are fatal: each one is reported to the caller, which owns the
/// retry or resynchronization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The requested rewind target is no longer retained, was never inserted,
    /// or has not been consumed yet.
    #[error("Tried to rewind past the bounds of the buffer")]
    InvalidRewindTarget,
    /// A blocking wait was cancelled through `interrupt`.
    #[error("Buffer wait interrupted")]
    Interrupted,
    /// A buffer or its history was configured to hold nothing.
    #[error("Buffer capacity must be greater than zero")]
    ZeroCapacity,
    /// A round-robin weight of zero would starve its sub-queue.
    #[error("Round robin weights must be greater than zero")]
    ZeroWeight,
    /// Wrap-aware sequence arithmetic only accepts non-negative values.
    #[error("Invalid sequence number: {0}")]
    InvalidSequenceNumber(i32),
}
