//! # tessera-ring
//!
//! A fixed-capacity, single-producer / multi-consumer ring of independently
//! locked slots, built for streaming pipelines (sensor frames, video frames)
//! where one thread produces and several threads read the newest item or drain
//! items in order.
//!
//! ## Design
//!
//! - One reader/writer lock per slot instead of a global lock
//! - Producer workflow: `write_next` → fill the slot through the guard → drop
//! - Consumer workflow: `consume_next_available` (oldest first) or
//!   `read_newest_available` (latest snapshot) → read → drop
//! - Guards release their lock and update the slot bookkeeping on drop, on
//!   every exit path
//! - Every blocking call is bounded by the configured lock timeout and fails
//!   with a typed [`RingError`]
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tessera_ring::{RingConfig, SlotRing};
//!
//! let cfg = RingConfig::new(4).with_lock_timeout(Duration::from_millis(100));
//! let ring = Arc::new(SlotRing::<u64>::with_config(cfg));
//!
//! // Producer: the slot is released and queued when `slot` goes out of scope.
//! {
//!     let (mut slot, overwrite) = ring.write_next().unwrap();
//!     assert!(!overwrite);
//!     *slot = 42;
//! }
//!
//! // Consumer: the slot is consumed when `slot` goes out of scope.
//! let consumer = {
//!     let ring = Arc::clone(&ring);
//!     std::thread::spawn(move || {
//!         let slot = ring.consume_next_available().unwrap();
//!         *slot
//!     })
//! };
//! assert_eq!(consumer.join().unwrap(), 42);
//! assert_eq!(ring.num_consumable_slots(), 0);
//! ```

mod buffer;
mod error;
mod guard;
mod ring;
mod slot;

pub use buffer::SlotRing;
pub use error::RingError;
pub use guard::{ConsumeGuard, ReadGuard, WriteGuard};
pub use ring::{DEFAULT_LOCK_TIMEOUT, RingConfig, next_index};
pub use slot::{RingSnapshot, SlotStatus};
