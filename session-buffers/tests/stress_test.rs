use bytes::Bytes;
use rand::{Rng, SeedableRng};
use session_buffers::{
    BoundedQueue, BufferReader, EncodedMessage, HistoryBuffer, INITIAL_SEQUENCE_NUMBER,
    NullRateLimiter, Payload, RateLimitedBuffer, RoundRobinBuffer, SequenceNumber,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const PRODUCERS: usize = 4;
const PER_PRODUCER: usize = 2_000;

/// Element tagged with its producer and that producer's running counter.
type Tagged = (usize, usize);

fn spawn_producers<Q>(queue: &Arc<Q>, seed: u64) -> Vec<thread::JoinHandle<()>>
where
    Q: BoundedQueue<Tagged> + 'static,
{
    (0..PRODUCERS)
        .map(|producer| {
            let queue = queue.clone();
            thread::spawn(move || {
                let mut rng = rand::rngs::StdRng::seed_from_u64(seed + producer as u64);
                for counter in 0..PER_PRODUCER {
                    assert!(queue.insert((producer, counter)));
                    if rng.gen_bool(0.01) {
                        thread::sleep(Duration::from_micros(rng.gen_range(10..200)));
                    }
                }
            })
        })
        .collect()
}

fn consume_and_check<Q>(queue: &Q) -> HashMap<usize, usize>
where
    Q: BufferReader<Tagged>,
{
    let mut next_expected: HashMap<usize, usize> = HashMap::new();
    for _ in 0..PRODUCERS * PER_PRODUCER {
        let (producer, counter) = queue.wait_and_poll().unwrap();
        let expected = next_expected.entry(producer).or_insert(0);
        assert_eq!(counter, *expected, "producer {} out of order", producer);
        *expected += 1;
    }
    next_expected
}

#[test]
fn test_rate_limited_multi_producer_stress() {
    let queue = Arc::new(RateLimitedBuffer::<Tagged>::new(16).unwrap());
    let producers = spawn_producers(&queue, 0);

    let counts = consume_and_check(queue.as_ref());
    for handle in producers {
        handle.join().unwrap();
    }
    assert_eq!(counts.len(), PRODUCERS);
    assert!(counts.values().all(|&n| n == PER_PRODUCER));
    assert!(queue.is_empty());
}

#[test]
fn test_round_robin_multi_producer_stress() {
    // Even producers feed the primary stream, odd ones the alternate stream.
    let queue = Arc::new(
        RoundRobinBuffer::new(8, Arc::new(NullRateLimiter), |e: &Tagged| e.0 % 2 == 1).unwrap(),
    );
    let producers = spawn_producers(&queue, 100);

    let counts = consume_and_check(queue.as_ref());
    for handle in producers {
        handle.join().unwrap();
    }
    assert!(counts.values().all(|&n| n == PER_PRODUCER));
    assert!(queue.is_empty());
    assert_eq!(queue.primary_len() + queue.alternate_len(), 0);
}

#[derive(Debug, Clone)]
struct Counter(u32);

impl Payload for Counter {
    fn materialize(&self, sequence_number: SequenceNumber) -> EncodedMessage {
        EncodedMessage::new(sequence_number, Bytes::from(self.0.to_be_bytes().to_vec()))
    }
}

#[test]
fn test_history_replay_under_concurrent_production() {
    const MESSAGES: u32 = 3_000;
    let source = Arc::new(RateLimitedBuffer::<Counter>::new(32).unwrap());
    let history =
        HistoryBuffer::<_, Counter>::new(source.clone(), INITIAL_SEQUENCE_NUMBER).unwrap();

    let producer = {
        let source = source.clone();
        thread::spawn(move || {
            for i in 0..MESSAGES {
                assert!(source.insert(Counter(i)));
            }
        })
    };

    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let mut delivered: Vec<EncodedMessage> = Vec::new();
    let mut highest = 0u32;
    while highest + 1 < MESSAGES || delivered.is_empty() {
        let message = history.wait_and_poll().unwrap();
        let value = u32::from_be_bytes(message.data[..].try_into().unwrap());
        assert_eq!(message.sequence_number, SequenceNumber(value as i32));
        highest = highest.max(value);
        delivered.push(message);

        if rng.gen_bool(0.05) {
            // Simulate a reconnect: resume from a random consumed message
            // that is still retained.
            let oldest = history.oldest_added_sequence_number().get();
            let target = rng.gen_range(oldest..=value as i32);
            history.rewind_to(SequenceNumber(target)).unwrap();
            let replayed = history.poll().unwrap();
            assert_eq!(replayed.sequence_number, SequenceNumber(target));
            let original = delivered
                .iter()
                .find(|m| m.sequence_number == SequenceNumber(target))
                .unwrap();
            assert_eq!(&replayed, original);
        }
    }
    producer.join().unwrap();
    assert_eq!(history.next_sequence_number(), SequenceNumber(MESSAGES as i32));
}
