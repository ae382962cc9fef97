use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tessera_frames::{SensorFrame, SensorId};
use tessera_pipeline::{Consumer, NewestReader, Producer, sleep_unless_stopped};
use tessera_ring::{RingConfig, RingError, SlotRing};

const TIMEOUT: Duration = Duration::from_millis(50);

fn ring(capacity: usize) -> SlotRing<SensorFrame> {
    SlotRing::with_config(RingConfig::new(capacity).with_lock_timeout(TIMEOUT))
}

fn producer() -> Producer {
    Producer::new(SensorId(4), Duration::ZERO, Duration::ZERO)
}

#[test]
fn consumer_sees_frames_in_production_order() {
    let ring = ring(4);
    let producer = producer();
    for seq in 0..4 {
        assert!(!producer.produce_once(&ring, seq).unwrap());
    }

    let consumer = Consumer::new(Duration::ZERO, Duration::ZERO);
    for seq in 0..4 {
        let frame = consumer.consume_once(&ring).unwrap();
        assert_eq!(frame.seq, seq);
        assert_eq!(frame.sensor_id, SensorId(4));
        assert!(frame.is_consistent());
    }
    assert_eq!(
        consumer.consume_once(&ring).unwrap_err(),
        RingError::DataAvailableTimeout
    );
}

#[test]
fn producer_reports_overwrite_when_lapping() {
    let ring = ring(2);
    let producer = producer();
    assert!(!producer.produce_once(&ring, 0).unwrap());
    assert!(!producer.produce_once(&ring, 1).unwrap());
    assert!(producer.produce_once(&ring, 2).unwrap());

    // Slot 0 now holds frame 2 and was re-queued behind frame 1.
    let consumer = Consumer::new(Duration::ZERO, Duration::ZERO);
    assert_eq!(consumer.consume_once(&ring).unwrap().seq, 1);
    assert_eq!(consumer.consume_once(&ring).unwrap().seq, 2);
}

#[test]
fn newest_reader_sees_latest_frame_without_consuming() {
    let ring = ring(3);
    let producer = producer();
    for seq in 0..3 {
        producer.produce_once(&ring, seq).unwrap();
    }

    let reader = NewestReader::new(Duration::ZERO, Duration::ZERO);
    assert_eq!(reader.read_once(&ring).unwrap().seq, 2);
    assert_eq!(reader.read_once(&ring).unwrap().seq, 2);
    assert_eq!(ring.num_consumable_slots(), 3);
}

#[test]
fn workers_run_concurrently_until_stopped() {
    let ring = ring(8);
    let stop = AtomicBool::new(false);

    let producer = Producer::new(SensorId(1), Duration::from_millis(1), Duration::from_millis(1));
    let consumer = Consumer::new(Duration::ZERO, Duration::ZERO);
    let reader = NewestReader::new(Duration::from_millis(1), Duration::ZERO);

    let (p, c, r) = thread::scope(|s| {
        let p = s.spawn(|| producer.run(&ring, &stop));
        let c = s.spawn(|| consumer.run(&ring, &stop));
        let r = s.spawn(|| reader.run(&ring, &stop));

        thread::sleep(Duration::from_millis(300));
        stop.store(true, Ordering::Relaxed);

        (
            p.join().expect("producer panicked"),
            c.join().expect("consumer panicked"),
            r.join().expect("reader panicked"),
        )
    });

    assert!(p.written > 0, "producer wrote nothing: {p:?}");
    assert_eq!(p.cursor_stalls, 0);
    assert!(c.consumed > 0, "consumer consumed nothing: {c:?}");
    assert!(c.consumed <= p.written);
    assert_eq!(c.inconsistent, 0);
    assert_eq!(c.out_of_order, 0);
    assert_eq!(r.inconsistent, 0);
}

#[test]
fn sleep_returns_early_once_stopped() {
    let stop = AtomicBool::new(true);
    let start = Instant::now();
    sleep_unless_stopped(Duration::from_secs(5), &stop);
    assert!(start.elapsed() < Duration::from_secs(1));
}
