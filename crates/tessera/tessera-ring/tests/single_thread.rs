//! Single-threaded behavior of the slot ring: slot states, guard release,
//! ordering and the structural operations.

use std::time::{Duration, Instant};
use tessera_ring::{RingConfig, RingError, SlotRing, SlotStatus};

/// Short timeout so the expected-failure cases stay fast.
const TIMEOUT: Duration = Duration::from_millis(50);

fn ring(capacity: usize) -> SlotRing<i32> {
    SlotRing::with_config(RingConfig::new(capacity).with_lock_timeout(TIMEOUT))
}

#[test]
fn fresh_ring_is_idle() {
    let buff = ring(5);
    assert_eq!(buff.size(), 5);
    assert!(!buff.is_read(0));
    assert!(!buff.is_written(0));
    assert_eq!(buff.num_consumable_slots(), 0);
    assert_eq!(buff.write_cursor(), 0);
}

#[test]
fn queries_out_of_range_return_defaults() {
    let buff = ring(5);
    assert!(!buff.is_written(6));
    assert!(!buff.is_read(6));
    assert!(!buff.is_dirty(6));
    assert_eq!(buff.num_concurrent_read(6), 0);
}

#[test]
fn default_ring_uses_one_second_timeout() {
    let buff = SlotRing::<i32>::new(3);
    assert_eq!(buff.lock_timeout(), Duration::from_secs(1));
}

#[test]
fn write_access_marks_slot_written() {
    let buff = ring(5);
    let (mut wa, overwrite) = buff.write_next().unwrap();
    *wa = 10;
    assert!(!overwrite);
    assert_eq!(wa.slot(), 0);
    assert!(buff.is_written(0));
}

#[test]
fn write_access_granted_to_every_slot() {
    let buff = ring(5);
    let mut held = Vec::new();
    for i in 0..5 {
        assert!(!buff.is_written(i));
        let (wa, _) = buff.write_next().unwrap();
        assert_eq!(wa.slot(), i);
        assert!(buff.is_written(i));
        held.push(wa);
    }
    assert_eq!(buff.write_cursor(), 0);
}

#[test]
fn full_lap_without_consumption_queues_every_slot() {
    let buff = ring(4);
    for _ in 0..4 {
        let (_wa, overwrite) = buff.write_next().unwrap();
        assert!(!overwrite);
    }
    assert_eq!(buff.num_consumable_slots(), 4);
    assert_eq!(buff.write_cursor(), 0);
}

#[test]
fn dropping_write_access_releases_slot() {
    let buff = ring(1);
    let (wa, _) = buff.write_next().unwrap();
    assert!(buff.is_written(0));
    drop(wa);
    assert!(!buff.is_written(0));
    assert!(buff.is_dirty(0));
}

#[test]
fn second_writer_times_out_until_first_releases() {
    let buff = ring(1);
    let (wa, _) = buff.write_next().unwrap();
    assert!(buff.is_written(0));

    let start = Instant::now();
    let err = buff.write_next().unwrap_err();
    assert_eq!(err, RingError::SlotAcqTimeout { slot: Some(0) });
    assert!(start.elapsed() >= TIMEOUT);

    drop(wa);
    assert!(!buff.is_written(0));

    let (wa2, overwrite) = buff.write_next().unwrap();
    assert_eq!(wa2.slot(), 0);
    assert!(overwrite, "slot 0 was produced but never consumed");
    assert!(buff.is_written(0));
}

#[test]
fn read_blocked_while_slot_is_written() {
    let buff = ring(1);
    let _wa = buff.write_next().unwrap();
    assert_eq!(
        buff.read_slot(0).unwrap_err(),
        RingError::SlotAcqTimeout { slot: Some(0) }
    );
    assert_eq!(buff.num_concurrent_read(0), 0);
}

#[test]
fn read_accesses_are_shared() {
    let buff = ring(1);
    drop(buff.write_next().unwrap());

    let ra = buff.read_slot(0).unwrap();
    let ra2 = buff.read_slot(0).unwrap();
    assert_eq!(buff.num_concurrent_read(0), 2);
    assert!(buff.is_read(0));

    drop(ra);
    assert_eq!(buff.num_concurrent_read(0), 1);
    drop(ra2);
    assert_eq!(buff.num_concurrent_read(0), 0);
    assert!(!buff.is_read(0));
}

#[test]
fn writer_times_out_while_slot_is_read() {
    let buff = ring(1);
    drop(buff.write_next().unwrap());

    let _ra = buff.read_slot(0).unwrap();
    assert_eq!(
        buff.write_next().unwrap_err(),
        RingError::SlotAcqTimeout { slot: Some(0) }
    );
    assert!(!buff.is_written(0));
}

#[test]
fn read_slot_rejects_out_of_range_index() {
    let buff = ring(3);
    let start = Instant::now();
    assert_eq!(
        buff.read_slot(3).unwrap_err(),
        RingError::InvalidSlot {
            slot: 3,
            capacity: 3
        }
    );
    assert!(start.elapsed() < TIMEOUT);
}

#[test]
fn written_value_is_visible_to_readers() {
    let buff = ring(3);
    {
        let (mut wa, _) = buff.write_next().unwrap();
        *wa = 77;
    }
    assert_eq!(*buff.read_slot(0).unwrap(), 77);
    assert_eq!(*buff.read_newest_available().unwrap(), 77);
    assert_eq!(*buff.consume_next_available().unwrap(), 77);
}

#[test]
fn consume_times_out_without_data() {
    let buff = ring(5);
    let start = Instant::now();
    assert_eq!(
        buff.consume_next_available().unwrap_err(),
        RingError::DataAvailableTimeout
    );
    assert!(start.elapsed() >= TIMEOUT);
}

#[test]
fn newest_read_waits_the_full_timeout_without_data() {
    let buff = ring(5);
    let start = Instant::now();
    assert_eq!(
        buff.read_newest_available().unwrap_err(),
        RingError::DataAvailableTimeout
    );
    assert!(start.elapsed() >= TIMEOUT);
}

#[test]
fn consume_takes_produced_slot() {
    let buff = ring(5);
    assert_eq!(buff.num_consumable_slots(), 0);
    drop(buff.write_next().unwrap());
    assert_eq!(buff.num_consumable_slots(), 1);

    let ca = buff.consume_next_available().unwrap();
    assert_eq!(ca.slot(), 0);
    assert_eq!(buff.num_consumable_slots(), 0);
    assert_eq!(buff.num_concurrent_read(0), 1);
    assert!(buff.is_dirty(0), "still dirty until the guard is released");

    drop(ca);
    assert!(!buff.is_written(0));
    assert!(!buff.is_dirty(0));
    assert_eq!(buff.num_concurrent_read(0), 0);
}

#[test]
fn consume_order_matches_production_order() {
    let buff = ring(5);
    for v in 0..5 {
        let (mut wa, _) = buff.write_next().unwrap();
        *wa = v * 10;
    }
    for v in 0..5 {
        let ca = buff.consume_next_available().unwrap();
        assert_eq!(ca.slot(), v as usize);
        assert_eq!(*ca, v * 10);
    }
    assert_eq!(buff.num_consumable_slots(), 0);
}

#[test]
fn consumed_slot_is_not_reported_as_overwrite() {
    let buff = ring(1);
    drop(buff.write_next().unwrap());
    drop(buff.consume_next_available().unwrap());

    let (_wa, overwrite) = buff.write_next().unwrap();
    assert!(!overwrite);
}

#[test]
fn overwrite_does_not_duplicate_queue_entries() {
    let buff = ring(2);
    let mut overwrites = Vec::new();
    for v in 0..3 {
        let (mut wa, overwrite) = buff.write_next().unwrap();
        *wa = v;
        overwrites.push(overwrite);
    }
    assert_eq!(overwrites, vec![false, false, true]);
    assert_eq!(buff.num_consumable_slots(), 2);

    let first = buff.consume_next_available().unwrap();
    assert_eq!((first.slot(), *first), (1, 1));
    drop(first);
    let second = buff.consume_next_available().unwrap();
    assert_eq!((second.slot(), *second), (0, 2));
    drop(second);

    assert_eq!(
        buff.consume_next_available().unwrap_err(),
        RingError::DataAvailableTimeout
    );
}

#[test]
fn newest_read_does_not_consume() {
    let buff = ring(4);
    for v in 0..3 {
        let (mut wa, _) = buff.write_next().unwrap();
        *wa = v;
    }
    let ra = buff.read_newest_available().unwrap();
    assert_eq!(ra.slot(), 2);
    assert_eq!(*ra, 2);
    assert_eq!(buff.num_consumable_slots(), 3);
    drop(ra);

    let ca = buff.consume_next_available().unwrap();
    assert_eq!(ca.slot(), 0);
}

#[test]
fn failed_consume_leaves_queue_untouched() {
    let buff = ring(1);
    drop(buff.write_next().unwrap());
    // Lap the ring: slot 0 is dirty, queued, and now exclusively held again.
    let (wa, overwrite) = buff.write_next().unwrap();
    assert!(overwrite);

    assert_eq!(
        buff.consume_next_available().unwrap_err(),
        RingError::SlotAcqTimeout { slot: Some(0) }
    );
    assert_eq!(buff.num_consumable_slots(), 1);
    assert!(buff.is_dirty(0));

    drop(wa);
    assert_eq!(buff.num_consumable_slots(), 1);
    assert_eq!(buff.consume_next_available().unwrap().slot(), 0);
}

#[test]
fn clear_discards_dirty_slots() {
    let buff = ring(5);
    drop(buff.write_next().unwrap());
    drop(buff.write_next().unwrap());
    assert!(buff.num_consumable_slots() > 0);

    buff.clear().unwrap();
    assert_eq!(buff.num_consumable_slots(), 0);
    assert_eq!(buff.write_cursor(), 0);
    assert!((0..5).all(|i| !buff.is_dirty(i)));

    let (wa, overwrite) = buff.write_next().unwrap();
    assert_eq!(wa.slot(), 0);
    assert!(!overwrite);
}

#[test]
fn from_fn_initializes_each_slot() {
    let buff = SlotRing::from_fn(RingConfig::new(3), |i| i * 100);
    for i in 0..3 {
        assert_eq!(*buff.read_slot(i).unwrap(), i * 100);
    }
}

#[test]
fn snapshot_reports_slot_states() {
    let buff = ring(4);
    drop(buff.write_next().unwrap()); // slot 0 dirty
    drop(buff.write_next().unwrap()); // slot 1 dirty
    let _ca = buff.consume_next_available().unwrap(); // slot 0 being consumed
    let _ra = buff.read_slot(1).unwrap();
    let _ra2 = buff.read_slot(1).unwrap();
    let _wa = buff.write_next().unwrap(); // slot 2 being written

    let snap = buff.snapshot();
    assert_eq!(
        snap.slots,
        vec![
            SlotStatus::Reading(1),
            SlotStatus::Reading(2),
            SlotStatus::Writing,
            SlotStatus::Idle,
        ]
    );
    assert_eq!(snap.consumable, 1);
    assert_eq!(snap.write_cursor, 3);
    assert_eq!(buff.to_string(), "[ 1R 2R  W  .  ]");
}

#[test]
fn display_shows_single_writer() {
    let buff = ring(3);
    let _wa = buff.write_next().unwrap();
    assert_eq!(buff.to_string(), "[  W  .  .  ]");
}
