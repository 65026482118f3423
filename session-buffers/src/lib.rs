//! # Session Buffers
//!
//! Thread-safe, bounded, in-memory buffers that sit between the producers of
//! outbound session messages and the transport that drains them.
//!
//! ## Components
//!
//! - **Sequence numbers**: Non-negative, wrapping `i32` identifiers with a
//!   sentinel for "none" and wrap-aware window checks.
//! - **Circular buffer**: Overwrites the oldest element when full and keeps
//!   consumed elements around so the reader can rewind into them.
//! - **History buffer**: Stamps payloads with sequence numbers as they are
//!   consumed and retains the encoded result, so a reconnecting peer can
//!   resume from any retained sequence number.
//! - **Rate limited buffer**: Bounded FIFO with blocking or rejecting inserts
//!   and pluggable throughput shaping.
//! - **Round robin buffer**: Two bounded FIFOs drained alternately, so a
//!   burst in one stream cannot starve the other.
//!
//! Every buffer implements [`BufferReader`]; the ones producers write into
//! also implement [`BoundedQueue`].

pub mod circular;
pub mod config;
pub mod error;
pub mod history;
pub mod message;
mod monitor;
pub mod queue;
pub mod rate_limit;
pub mod rate_limited;
pub mod round_robin;
pub mod sequence;

pub use circular::CircularBuffer;
pub use config::{BufferConfig, DEFAULT_QUEUE_CAPACITY, InsertMode, RateLimitPolicy};
pub use error::BufferError;
pub use history::HistoryBuffer;
pub use message::{EncodedMessage, Payload};
pub use queue::{BoundedQueue, BufferReader, ElementFinder};
pub use rate_limit::{ExponentialRateLimiter, NullRateLimiter, RateLimiter};
pub use rate_limited::RateLimitedBuffer;
pub use round_robin::{QueueAlternator, RoundRobinBuffer, Turn, Weights};
pub use sequence::{
    AtomicSequenceNumber, INITIAL_SEQUENCE_NUMBER, MAX_SEQUENCE_NUMBER, NO_SEQUENCE_NUMBER,
    SequenceNumber,
};
