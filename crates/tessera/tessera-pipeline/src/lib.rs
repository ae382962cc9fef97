//! Worker loops that drive a [`SlotRing`] of sensor frames.
//!
//! One [`Producer`] writes frames, any number of [`Consumer`]s drain them in
//! production order and any number of [`NewestReader`]s peek at the latest
//! frame. Each worker holds its guard for a configurable time, simulating
//! processing, and stops once the shared stop flag is raised.
//!
//! [`SlotRing`]: tessera_ring::SlotRing

mod consumer;
mod producer;

pub use consumer::{Consumer, ConsumerStats, NewestReader, ReaderStats};
pub use producer::{Producer, ProducerStats};

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Longest single sleep, so a raised stop flag is noticed promptly.
const STOP_POLL: Duration = Duration::from_millis(20);

/// Sleeps for `dur`, returning early once `stop` is raised.
pub fn sleep_unless_stopped(dur: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + dur;
    loop {
        if stop.load(Ordering::Relaxed) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        std::thread::sleep((deadline - now).min(STOP_POLL));
    }
}

pub(crate) fn now_ns() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|t| t.as_nanos() as u64)
        .unwrap_or_default()
}
