use crate::circular::CircularBuffer;
use crate::config::BufferConfig;
use crate::error::BufferError;
use crate::message::{EncodedMessage, Payload};
use crate::queue::{BoundedQueue, BufferReader};
use crate::sequence::{NO_SEQUENCE_NUMBER, SequenceNumber};
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long a blocked consumer waits on the source before re-checking for
/// history made readable by a rewind.
const REWIND_CHECK_INTERVAL: Duration = Duration::from_millis(10);

/// Turns a queue of outbound payloads into a sequence-numbered, replayable
/// stream.
///
/// Payloads are stamped when they are first consumed and the resulting
/// [`EncodedMessage`] is kept in a [`CircularBuffer`] of the same capacity as
/// the source queue. After a reconnect, [`rewind_to`](Self::rewind_to) makes
/// the consumer see the stored messages again, byte for byte.
///
/// Lock order is `allocator -> source -> control -> history`; the source and
/// the history are never locked at the same time.
#[derive(Debug)]
pub struct HistoryBuffer<Q, P> {
    source: Arc<Q>,
    history: CircularBuffer<EncodedMessage>,
    /// Next number to stamp. Held for the whole pull-stamp-store step so
    /// numbers are assigned in consumption order.
    allocator: Mutex<SequenceNumber>,
    /// A control message waiting to be delivered; never part of the history.
    control: Mutex<Option<EncodedMessage>>,
    _payload: PhantomData<fn() -> P>,
}

impl<Q, P> HistoryBuffer<Q, P>
where
    Q: BoundedQueue<P>,
    P: Payload,
{
    /// Retains as much history as `source` can hold.
    pub fn new(source: Arc<Q>, initial: SequenceNumber) -> Result<Self, BufferError> {
        let capacity = source.capacity();
        Self::with_history_capacity(source, initial, capacity)
    }

    pub fn with_history_capacity(
        source: Arc<Q>,
        initial: SequenceNumber,
        history_capacity: usize,
    ) -> Result<Self, BufferError> {
        if history_capacity < source.capacity() {
            warn!(
                "History capacity {} is smaller than source capacity {}; deep rewinds may fail",
                history_capacity,
                source.capacity()
            );
        }
        Ok(Self {
            history: CircularBuffer::new(history_capacity)?,
            source,
            allocator: Mutex::new(initial),
            control: Mutex::new(None),
            _payload: PhantomData,
        })
    }

    pub fn from_config(source: Arc<Q>, config: &BufferConfig) -> Result<Self, BufferError> {
        config.validate()?;
        let capacity = config.history_capacity.unwrap_or_else(|| source.capacity());
        Self::with_history_capacity(source, config.initial_sequence_number, capacity)
    }

    pub fn source(&self) -> &Arc<Q> {
        &self.source
    }

    /// The number the next payload pulled from the source will receive.
    pub fn next_sequence_number(&self) -> SequenceNumber {
        *self.allocator.lock()
    }

    /// Rewinds so that the message stamped `sequence_number` is delivered next.
    ///
    /// Discards any pending control message.
    pub fn rewind_to(&self, sequence_number: SequenceNumber) -> Result<(), BufferError> {
        self.control.lock().take();
        let result = self
            .history
            .rewind_to(|message: &EncodedMessage| message.sequence_number == sequence_number);
        match result {
            Ok(()) => debug!("Rewound history to sequence number {}", sequence_number),
            Err(_) => warn!(
                "Cannot rewind to sequence number {} (retained {}..={})",
                sequence_number,
                self.oldest_added_sequence_number(),
                self.newest_added_sequence_number()
            ),
        }
        result
    }

    /// Rewinds to the first message ever stamped, if it is still retained.
    pub fn rewind_to_first(&self) -> Result<(), BufferError> {
        self.control.lock().take();
        let result = self.history.rewind_to_first();
        if result.is_err() {
            warn!("Cannot rewind to first message: history has wrapped");
        }
        result
    }

    pub fn rewind_by(&self, steps: usize) -> Result<(), BufferError> {
        self.control.lock().take();
        self.history.rewind_by(steps)
    }

    /// Sequence number of the oldest retained message, or
    /// [`NO_SEQUENCE_NUMBER`] if nothing has been stamped yet.
    pub fn oldest_added_sequence_number(&self) -> SequenceNumber {
        self.history
            .peek_oldest()
            .map_or(NO_SEQUENCE_NUMBER, |message| message.sequence_number)
    }

    pub fn newest_added_sequence_number(&self) -> SequenceNumber {
        self.history
            .peek_newest()
            .map_or(NO_SEQUENCE_NUMBER, |message| message.sequence_number)
    }

    fn has_pending(&self) -> bool {
        self.control.lock().is_some() || !self.history.is_empty()
    }

    fn store(&self, allocator: &mut SequenceNumber, payload: P) {
        let sequence_number = *allocator;
        *allocator = sequence_number.next();
        let message = payload.materialize(sequence_number);
        if message.is_control {
            *self.control.lock() = Some(message);
        } else {
            self.history.insert(message);
        }
    }

    fn poll_into_history(&self, allocator: &mut SequenceNumber) {
        if self.has_pending() {
            return;
        }
        if let Some(payload) = self.source.poll() {
            self.store(allocator, payload);
        }
    }

    /// Waits until there is something to deliver or `deadline` passes.
    ///
    /// Rewinds do not take the allocator lock, so the source is waited on in
    /// short slices and pending history is re-checked between them.
    fn wait_and_poll_into_history(
        &self,
        allocator: &mut SequenceNumber,
        deadline: Option<Instant>,
    ) -> Result<(), BufferError> {
        loop {
            if self.has_pending() {
                return Ok(());
            }
            let mut slice = REWIND_CHECK_INTERVAL;
            if let Some(deadline) = deadline {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Ok(());
                }
                slice = slice.min(remaining);
            }
            if let Some(payload) = self.source.wait_and_poll_timeout(slice)? {
                self.store(allocator, payload);
                return Ok(());
            }
        }
    }

    fn take_next(&self) -> Option<EncodedMessage> {
        if let Some(message) = self.control.lock().take() {
            return Some(message);
        }
        self.history.poll()
    }

    fn peek_next(&self) -> Option<EncodedMessage> {
        if let Some(message) = self.control.lock().as_ref() {
            return Some(message.clone());
        }
        self.history.peek()
    }
}

impl<Q, P> BufferReader<EncodedMessage> for HistoryBuffer<Q, P>
where
    Q: BoundedQueue<P>,
    P: Payload,
{
    fn poll(&self) -> Option<EncodedMessage> {
        let mut allocator = self.allocator.lock();
        self.poll_into_history(&mut allocator);
        self.take_next()
    }

    fn peek(&self) -> Option<EncodedMessage> {
        let mut allocator = self.allocator.lock();
        self.poll_into_history(&mut allocator);
        self.peek_next()
    }

    fn wait_and_poll(&self) -> Result<EncodedMessage, BufferError> {
        let mut allocator = self.allocator.lock();
        self.wait_and_poll_into_history(&mut allocator, None)?;
        self.take_next().ok_or(BufferError::Interrupted)
    }

    fn wait_and_peek(&self) -> Result<EncodedMessage, BufferError> {
        let mut allocator = self.allocator.lock();
        self.wait_and_poll_into_history(&mut allocator, None)?;
        self.peek_next().ok_or(BufferError::Interrupted)
    }

    fn wait_and_poll_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Option<EncodedMessage>, BufferError> {
        let mut allocator = self.allocator.lock();
        self.wait_and_poll_into_history(&mut allocator, Some(Instant::now() + timeout))?;
        Ok(self.take_next())
    }

    /// Waits for the source queue to drain.
    fn wait_until_empty(&self, timeout: Duration) -> bool {
        self.source.wait_until_empty(timeout)
    }

    fn len(&self) -> usize {
        let control = usize::from(self.control.lock().is_some());
        self.history.len() + self.source.len() + control
    }

    fn capacity(&self) -> usize {
        self.history.capacity()
    }

    fn interrupt(&self, interrupt: bool) {
        self.source.interrupt(interrupt);
        self.history.interrupt(interrupt);
    }
}
