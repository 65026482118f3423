use crate::sequence::SequenceNumber;
use bytes::Bytes;

/// An immutable, sequence-stamped unit ready for transport.
///
/// Cloning is cheap: the encoded bytes are reference counted, so replaying a
/// message after a rewind hands out the very bytes produced the first time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage {
    pub sequence_number: SequenceNumber,
    /// Control messages (heartbeats, session control) are delivered once and
    /// never replayed.
    pub is_control: bool,
    pub data: Bytes,
}

impl EncodedMessage {
    pub fn new(sequence_number: SequenceNumber, data: impl Into<Bytes>) -> Self {
        Self {
            sequence_number,
            is_control: false,
            data: data.into(),
        }
    }

    pub fn control(sequence_number: SequenceNumber, data: impl Into<Bytes>) -> Self {
        Self {
            sequence_number,
            is_control: true,
            data: data.into(),
        }
    }
}

/// An outbound payload that has not been assigned a sequence number yet.
pub trait Payload {
    /// Encodes the payload stamped with `sequence_number`.
    ///
    /// Called exactly once per payload, when it is first consumed.
    fn materialize(&self, sequence_number: SequenceNumber) -> EncodedMessage;
}
