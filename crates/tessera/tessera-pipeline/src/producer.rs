use crate::{now_ns, sleep_unless_stopped};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tessera_frames::{SensorFrame, SensorId};
use tessera_ring::{RingError, SlotRing};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerStats {
    pub written: u64,
    pub overwrites: u64,
    pub timeouts: u64,
    /// Writes whose slot was granted but whose cursor advance timed out.
    pub cursor_stalls: u64,
}

/// Writes one frame per iteration into the next slot of the ring.
///
/// Must be the only writer of its ring.
#[derive(Debug, Clone)]
pub struct Producer {
    pub sensor_id: SensorId,
    /// Time the write guard is held after filling the frame.
    pub hold: Duration,
    /// Pause after releasing the slot.
    pub idle: Duration,
}

impl Producer {
    pub fn new(sensor_id: SensorId, hold: Duration, idle: Duration) -> Self {
        Self {
            sensor_id,
            hold,
            idle,
        }
    }

    /// Writes frame `seq` into the next slot and releases it immediately.
    ///
    /// Returns whether an unconsumed frame was overwritten.
    pub fn produce_once(&self, ring: &SlotRing<SensorFrame>, seq: u64) -> Result<bool, RingError> {
        let (mut slot, overwrite) = ring.write_next()?;
        slot.fill(seq, now_ns(), self.sensor_id);
        Ok(overwrite)
    }

    /// Produces until `stop` is raised.
    pub fn run(&self, ring: &SlotRing<SensorFrame>, stop: &AtomicBool) -> ProducerStats {
        let mut stats = ProducerStats::default();
        let mut seq = 0u64;

        while !stop.load(Ordering::Relaxed) {
            match ring.write_next() {
                Ok((mut slot, overwrite)) => {
                    slot.fill(seq, now_ns(), self.sensor_id);
                    if overwrite {
                        stats.overwrites += 1;
                        debug!(seq, slot = slot.slot(), "overwrite occurred");
                    }
                    if !slot.cursor_advanced() {
                        stats.cursor_stalls += 1;
                    }
                    sleep_unless_stopped(self.hold, stop);
                    stats.written += 1;
                    seq += 1;
                }
                Err(e) => {
                    stats.timeouts += 1;
                    warn!(error = %e, "write lock timeout");
                }
            }
            sleep_unless_stopped(self.idle, stop);
        }

        info!(
            written = stats.written,
            overwrites = stats.overwrites,
            timeouts = stats.timeouts,
            cursor_stalls = stats.cursor_stalls,
            "producer stopped"
        );
        stats
    }
}
