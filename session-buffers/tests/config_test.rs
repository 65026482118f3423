use session_buffers::{
    BufferConfig, BufferError, DEFAULT_QUEUE_CAPACITY, INITIAL_SEQUENCE_NUMBER, InsertMode,
    RateLimitPolicy, SequenceNumber, Weights,
};

#[test]
fn test_defaults() {
    let config = BufferConfig::default();
    assert_eq!(config.capacity, DEFAULT_QUEUE_CAPACITY);
    assert_eq!(config.insert_mode, InsertMode::Blocking);
    assert_eq!(config.rate_limit, RateLimitPolicy::None);
    assert_eq!(config.initial_sequence_number, INITIAL_SEQUENCE_NUMBER);
    assert_eq!(config.history_capacity, None);
    assert_eq!(
        config.round_robin_weights,
        Weights {
            primary: 1,
            alternate: 1
        }
    );
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn test_validate_rejects_zero_capacity() {
    let config = BufferConfig {
        capacity: 0,
        ..BufferConfig::default()
    };
    assert_eq!(config.validate(), Err(BufferError::ZeroCapacity));

    let config = BufferConfig {
        history_capacity: Some(0),
        ..BufferConfig::default()
    };
    assert_eq!(config.validate(), Err(BufferError::ZeroCapacity));
}

#[test]
fn test_validate_rejects_invalid_initial_sequence_number() {
    let config = BufferConfig {
        initial_sequence_number: SequenceNumber(-3),
        ..BufferConfig::default()
    };
    assert_eq!(
        config.validate(),
        Err(BufferError::InvalidSequenceNumber(-3))
    );
}

#[test]
fn test_validate_rejects_zero_weight() {
    let config = BufferConfig {
        round_robin_weights: Weights {
            primary: 1,
            alternate: 0,
        },
        ..BufferConfig::default()
    };
    assert_eq!(config.validate(), Err(BufferError::ZeroWeight));
}

#[test]
fn test_error_messages() {
    assert_eq!(
        BufferError::InvalidSequenceNumber(-3).to_string(),
        "Invalid sequence number: -3"
    );
    assert_eq!(
        BufferError::ZeroCapacity.to_string(),
        "Buffer capacity must be greater than zero"
    );
    assert_eq!(
        BufferError::ZeroWeight.to_string(),
        "Round robin weights must be greater than zero"
    );
}
