use crate::sleep_unless_stopped;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tessera_frames::SensorFrame;
use tessera_ring::{RingError, SlotRing};
use tracing::{info, trace, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub consumed: u64,
    pub data_timeouts: u64,
    pub slot_timeouts: u64,
    /// Frames whose samples did not match their sequence number.
    pub inconsistent: u64,
    /// Frames whose sequence number was not above the previous one.
    pub out_of_order: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub reads: u64,
    pub timeouts: u64,
    pub inconsistent: u64,
}

/// Drains frames oldest first, consuming each one.
#[derive(Debug, Clone)]
pub struct Consumer {
    /// Time the consume guard is held, simulating processing.
    pub hold: Duration,
    /// Pause after releasing the slot.
    pub idle: Duration,
}

/// Repeatedly looks at the newest frame without consuming it.
#[derive(Debug, Clone)]
pub struct NewestReader {
    pub hold: Duration,
    pub idle: Duration,
}

impl Consumer {
    pub fn new(hold: Duration, idle: Duration) -> Self {
        Self { hold, idle }
    }

    /// Consumes the oldest available frame and returns a copy of it.
    pub fn consume_once(&self, ring: &SlotRing<SensorFrame>) -> Result<SensorFrame, RingError> {
        let slot = ring.consume_next_available()?;
        Ok(*slot)
    }

    /// Consumes until `stop` is raised.
    pub fn run(&self, ring: &SlotRing<SensorFrame>, stop: &AtomicBool) -> ConsumerStats {
        let mut stats = ConsumerStats::default();
        let mut last_seq: Option<u64> = None;

        while !stop.load(Ordering::Relaxed) {
            match ring.consume_next_available() {
                Ok(slot) => {
                    let frame = *slot;
                    trace!(seq = frame.seq, slot = slot.slot(), "frame consumed");
                    if !frame.is_consistent() {
                        stats.inconsistent += 1;
                        warn!(seq = frame.seq, "inconsistent frame");
                    }
                    if last_seq.is_some_and(|last| frame.seq <= last) {
                        stats.out_of_order += 1;
                        warn!(seq = frame.seq, ?last_seq, "frame out of order");
                    }
                    last_seq = Some(frame.seq);
                    stats.consumed += 1;
                    sleep_unless_stopped(self.hold, stop);
                }
                Err(RingError::DataAvailableTimeout) => {
                    stats.data_timeouts += 1;
                    warn!("data available timeout");
                }
                Err(e) => {
                    stats.slot_timeouts += 1;
                    warn!(error = %e, "consume lock timeout");
                }
            }
            sleep_unless_stopped(self.idle, stop);
        }

        info!(
            consumed = stats.consumed,
            data_timeouts = stats.data_timeouts,
            slot_timeouts = stats.slot_timeouts,
            inconsistent = stats.inconsistent,
            out_of_order = stats.out_of_order,
            "consumer stopped"
        );
        stats
    }
}

impl NewestReader {
    pub fn new(hold: Duration, idle: Duration) -> Self {
        Self { hold, idle }
    }

    /// Returns a copy of the most recently produced frame.
    pub fn read_once(&self, ring: &SlotRing<SensorFrame>) -> Result<SensorFrame, RingError> {
        let slot = ring.read_newest_available()?;
        Ok(*slot)
    }

    /// Reads until `stop` is raised.
    pub fn run(&self, ring: &SlotRing<SensorFrame>, stop: &AtomicBool) -> ReaderStats {
        let mut stats = ReaderStats::default();

        while !stop.load(Ordering::Relaxed) {
            match ring.read_newest_available() {
                Ok(slot) => {
                    if !slot.is_consistent() {
                        stats.inconsistent += 1;
                        warn!(seq = slot.seq, "inconsistent frame");
                    }
                    stats.reads += 1;
                    sleep_unless_stopped(self.hold, stop);
                }
                Err(e) => {
                    stats.timeouts += 1;
                    trace!(error = %e, "newest read failed");
                }
            }
            sleep_unless_stopped(self.idle, stop);
        }

        info!(
            reads = stats.reads,
            timeouts = stats.timeouts,
            inconsistent = stats.inconsistent,
            "reader stopped"
        );
        stats
    }
}
