use session_buffers::{
    AtomicSequenceNumber, BufferError, INITIAL_SEQUENCE_NUMBER, MAX_SEQUENCE_NUMBER,
    NO_SEQUENCE_NUMBER, SequenceNumber,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

#[test]
fn test_constants() {
    assert_eq!(NO_SEQUENCE_NUMBER.get(), i32::MIN);
    assert_eq!(INITIAL_SEQUENCE_NUMBER.get(), 0);
    assert_eq!(MAX_SEQUENCE_NUMBER.get(), i32::MAX);
    assert_eq!(SequenceNumber::default(), INITIAL_SEQUENCE_NUMBER);
}

#[test]
fn test_validity() {
    assert!(SequenceNumber(0).is_valid());
    assert!(MAX_SEQUENCE_NUMBER.is_valid());
    assert!(!SequenceNumber(-1).is_valid());
    assert!(!NO_SEQUENCE_NUMBER.is_valid());
}

#[test]
fn test_next() {
    assert_eq!(SequenceNumber(20).next(), SequenceNumber(21));
    assert_eq!(MAX_SEQUENCE_NUMBER.next(), INITIAL_SEQUENCE_NUMBER);
    assert_eq!(MAX_SEQUENCE_NUMBER.next().next(), SequenceNumber(1));
}

#[test]
fn test_next_from_invalid_restarts() {
    assert_eq!(SequenceNumber(-1000).next(), INITIAL_SEQUENCE_NUMBER);
    assert_eq!(SequenceNumber(-1).next(), INITIAL_SEQUENCE_NUMBER);
    assert_eq!(NO_SEQUENCE_NUMBER.next(), INITIAL_SEQUENCE_NUMBER);
}

#[test]
fn test_wrapping_sum() {
    assert_eq!(
        SequenceNumber(50).wrapping_sum(SequenceNumber(5)),
        SequenceNumber(55)
    );
    assert_eq!(
        SequenceNumber(i32::MAX - 1).wrapping_sum(SequenceNumber(10)),
        SequenceNumber(8)
    );
    assert_eq!(
        MAX_SEQUENCE_NUMBER.wrapping_sum(SequenceNumber(1)),
        INITIAL_SEQUENCE_NUMBER
    );
}

#[test]
fn test_in_interval() {
    let n = SequenceNumber;
    assert_eq!(n(5).in_interval(n(1), n(10)), Ok(true));
    assert_eq!(n(1).in_interval(n(1), n(10)), Ok(true));
    assert_eq!(n(10).in_interval(n(1), n(10)), Ok(true));
    assert_eq!(n(11).in_interval(n(1), n(10)), Ok(false));
    assert_eq!(n(0).in_interval(n(1), n(10)), Ok(false));
}

#[test]
fn test_in_interval_wrapped_window() {
    let n = SequenceNumber;
    let oldest = n(i32::MAX - 2);
    let newest = n(3);
    assert_eq!(MAX_SEQUENCE_NUMBER.in_interval(oldest, newest), Ok(true));
    assert_eq!(n(0).in_interval(oldest, newest), Ok(true));
    assert_eq!(n(3).in_interval(oldest, newest), Ok(true));
    assert_eq!(n(4).in_interval(oldest, newest), Ok(false));
    assert_eq!(n(1000).in_interval(oldest, newest), Ok(false));
}

#[test]
fn test_in_interval_rejects_negative() {
    let n = SequenceNumber;
    assert_eq!(
        n(-1).in_interval(n(0), n(10)),
        Err(BufferError::InvalidSequenceNumber(-1))
    );
    assert_eq!(
        n(5).in_interval(NO_SEQUENCE_NUMBER, n(10)),
        Err(BufferError::InvalidSequenceNumber(i32::MIN))
    );
}

#[test]
fn test_display() {
    assert_eq!(SequenceNumber(42).to_string(), "42");
    assert_eq!(SequenceNumber::from(7), SequenceNumber(7));
}

#[test]
fn test_atomic_get_and_set() {
    let num = AtomicSequenceNumber::new(SequenceNumber(40));
    assert_eq!(num.get_and_set(SequenceNumber(60)), SequenceNumber(40));
    assert_eq!(num.get(), SequenceNumber(60));

    num.get_and_set(NO_SEQUENCE_NUMBER);
    assert_eq!(num.get(), NO_SEQUENCE_NUMBER);

    num.set(SequenceNumber(5));
    assert_eq!(num.get(), SequenceNumber(5));
}

#[test]
fn test_atomic_increment_wraps() {
    let num = AtomicSequenceNumber::new(MAX_SEQUENCE_NUMBER);
    assert_eq!(num.get_and_increment(), MAX_SEQUENCE_NUMBER);
    assert_eq!(num.get(), INITIAL_SEQUENCE_NUMBER);
    assert_eq!(num.increment_and_get(), SequenceNumber(1));

    let invalid = AtomicSequenceNumber::new(SequenceNumber(-5));
    assert_eq!(invalid.increment_and_get(), INITIAL_SEQUENCE_NUMBER);
}

#[test]
fn test_atomic_concurrent_increments_are_unique() {
    let num = Arc::new(AtomicSequenceNumber::default());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let num = num.clone();
            thread::spawn(move || {
                (0..1000)
                    .map(|_| num.get_and_increment())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for value in handle.join().unwrap() {
            assert!(seen.insert(value));
        }
    }
    assert_eq!(seen.len(), 4000);
    assert_eq!(num.get(), SequenceNumber(4000));
}
