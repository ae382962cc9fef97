//! Single-producer, multi-consumer slot ring with per-slot locking.
//!
//! The ring owns a fixed number of item cells, each behind its own
//! reader/writer lock, plus a parallel table of slot descriptors. Access to a
//! cell is only possible through a guard ([`WriteGuard`], [`ReadGuard`],
//! [`ConsumeGuard`]).
//!
//! # Design
//! - **Producer**: `write_next` locks the slot under the write cursor
//!   exclusively and advances the cursor. Releasing the guard marks the slot
//!   dirty, queues its index and wakes waiting consumers.
//! - **Readers**: `read_slot` and `read_newest_available` take shared locks
//!   without consuming anything.
//! - **Consumers**: `consume_next_available` takes the oldest queued slot in
//!   production order; releasing the guard clears the slot's dirty state.
//!
//! # Synchronization Domains
//!
//! ```text
//! ┌────────────────────┬───────────────────────────────────────────┐
//! │ slot locks         │ RwLock<T> per slot, timeout-bounded       │
//! │ structural lock    │ cursor advance, clear(), snapshot()       │
//! │ availability lock  │ dirty queue + condvar for consumer wakeup │
//! └────────────────────┴───────────────────────────────────────────┘
//! ```
//!
//! Only the producer holds the structural lock and a slot lock together.
//! No thread waits for a slot lock while holding the availability lock, and
//! no thread ever holds two slot locks.
//!
//! # Thread Safety
//! `SlotRing<T>` is `Sync` when `T: Send + Sync`; share it with `Arc`.
//! Only one thread may call `write_next` at a time (single producer). That
//! contract is not enforced unless `RingConfig::serialize_writers` is set.

use crate::error::RingError;
use crate::guard::{ConsumeGuard, ReadGuard, WriteGuard};
use crate::ring::{RingConfig, next_index};
use crate::slot::{RingSnapshot, SlotState};
use parking_lot::{Condvar, Mutex, MutexGuard, RwLock};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// A fixed-capacity ring of independently locked slots.
///
/// # Type Parameter
/// - `T`: The item type stored in each slot. Items are mutated in place
///   through a [`WriteGuard`]; they are never moved out of the ring.
pub struct SlotRing<T> {
    /// Item storage, one lock per slot.
    slots: Box<[RwLock<T>]>,
    /// Descriptors, parallel to `slots`.
    states: Box<[SlotState]>,
    /// Next slot the producer will write. Advanced only under `structural`.
    write_cursor: AtomicUsize,
    structural: Mutex<()>,
    /// Produced-and-unconsumed slot indices, oldest first.
    dirty_slots: Mutex<VecDeque<usize>>,
    data_available: Condvar,
    /// Mirror of `dirty_slots.len()` for lock-free status queries.
    consumable: AtomicUsize,
    config: RingConfig,
}

impl<T: Default> SlotRing<T> {
    /// Creates a ring of `capacity` default-initialized slots with the default
    /// lock timeout.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::with_config(RingConfig::new(capacity))
    }

    /// Creates a ring of default-initialized slots from a full configuration.
    pub fn with_config(config: RingConfig) -> Self {
        Self::from_fn(config, |_| T::default())
    }
}

impl<T> SlotRing<T> {
    /// Creates a ring whose slot `i` is initialized to `init(i)`.
    ///
    /// # Panics
    /// Panics if `config.capacity` is zero.
    pub fn from_fn(config: RingConfig, mut init: impl FnMut(usize) -> T) -> Self {
        assert!(config.capacity > 0, "Capacity must be non-zero");
        let slots = (0..config.capacity).map(|i| RwLock::new(init(i))).collect();
        let states = (0..config.capacity).map(|_| SlotState::default()).collect();

        debug!(
            capacity = config.capacity,
            lock_timeout = ?config.lock_timeout,
            serialize_writers = config.serialize_writers,
            "slot ring created"
        );

        Self {
            slots,
            states,
            write_cursor: AtomicUsize::new(0),
            structural: Mutex::new(()),
            dirty_slots: Mutex::new(VecDeque::with_capacity(config.capacity)),
            data_available: Condvar::new(),
            consumable: AtomicUsize::new(0),
            config,
        }
    }

    // ── Producer ────────────────────────────────────────────────────────────

    /// Gains exclusive write access to the next slot.
    ///
    /// Returns the guard and whether the slot still held unconsumed data
    /// (an overwrite). Normally the cursor has already moved past the slot
    /// when this returns.
    ///
    /// # Cursor Stall
    /// If the slot lock was granted but the structural lock then timed out,
    /// write access is kept: the guard is still returned, but the cursor did
    /// not advance. [`WriteGuard::cursor_advanced`] is false and
    /// [`WriteGuard::cursor_error`] reports `SlotAcqTimeout { slot: None }`.
    /// The next `write_next` targets the same slot again.
    ///
    /// # Errors
    /// - `SlotAcqTimeout { slot: Some(i) }` if slot `i` stays locked by a reader
    ///   or an earlier writer for the whole timeout window
    /// - `SlotAcqTimeout { slot: None }` if `serialize_writers` is set and the
    ///   structural lock could not be taken before the slot lock
    ///
    /// # Single-Producer Contract
    /// Only one thread may call this at a time. Concurrent calls race on the
    /// cursor read unless the ring was built with `serialize_writers`.
    pub fn write_next(&self) -> Result<(WriteGuard<'_, T>, bool), RingError> {
        let timeout = self.config.lock_timeout;
        let serialized = if self.config.serialize_writers {
            Some(self.lock_structural()?)
        } else {
            None
        };

        let slot = self.write_cursor.load(Ordering::Acquire);
        let item = self.slots[slot]
            .try_write_for(timeout)
            .ok_or(RingError::SlotAcqTimeout { slot: Some(slot) })?;
        let overwrote = self.states[slot].is_dirty();
        let guard = WriteGuard::new(self, slot, overwrote, item);
        if overwrote {
            debug!(slot, "overwriting unconsumed slot");
        }

        let structural = match serialized {
            Some(structural) => Ok(structural),
            None => self.lock_structural(),
        };
        match structural {
            Ok(structural) => {
                let cursor = self.write_cursor.load(Ordering::Relaxed);
                self.write_cursor
                    .store(next_index(cursor, self.slots.len()), Ordering::Release);
                drop(structural);
                Ok((guard, overwrote))
            }
            Err(e) => {
                warn!(slot, error = %e, "cursor not advanced, write access kept");
                Ok((guard.with_cursor_stalled(), overwrote))
            }
        }
    }

    // ── Readers ─────────────────────────────────────────────────────────────

    /// Gains shared read access to an arbitrary slot.
    ///
    /// # Errors
    /// - `InvalidSlot` if `slot >= size()`
    /// - `SlotAcqTimeout` if a write guard holds the slot for the whole
    ///   timeout window
    pub fn read_slot(&self, slot: usize) -> Result<ReadGuard<'_, T>, RingError> {
        let cell = self.slots.get(slot).ok_or(RingError::InvalidSlot {
            slot,
            capacity: self.slots.len(),
        })?;
        let item = cell
            .try_read_for(self.config.lock_timeout)
            .ok_or(RingError::SlotAcqTimeout { slot: Some(slot) })?;
        Ok(ReadGuard::new(self, slot, item))
    }

    /// Gains shared read access to the most recently produced slot, waiting
    /// for one to exist.
    ///
    /// The slot stays queued for consumption. The result is a best-effort
    /// snapshot: several callers may see the same slot, and a newer write
    /// may supersede it as soon as this returns.
    ///
    /// # Errors
    /// - `DataAvailableTimeout` if nothing was produced within the timeout
    /// - `SlotAcqTimeout` if the newest slot could not be locked in time
    pub fn read_newest_available(&self) -> Result<ReadGuard<'_, T>, RingError> {
        let slot = {
            let dirty = self.wait_for_data()?;
            match dirty.back() {
                Some(&slot) => slot,
                None => return Err(RingError::DataAvailableTimeout),
            }
        };

        let item = self.slots[slot]
            .try_read_for(self.config.lock_timeout)
            .ok_or(RingError::SlotAcqTimeout { slot: Some(slot) })?;
        Ok(ReadGuard::new(self, slot, item))
    }

    // ── Consumers ───────────────────────────────────────────────────────────

    /// Gains shared access to the oldest unconsumed slot, waiting for one to
    /// exist. The slot is consumed when the guard is dropped.
    ///
    /// # Protocol
    /// 1. Wait on the availability condition until the dirty queue is non-empty
    /// 2. Note the index at the front and release the availability lock
    /// 3. Shared-lock that slot, bounded by the timeout
    /// 4. Re-take the availability lock; if the index is still at the front,
    ///    pop it and bind the guard, otherwise another consumer took it or the
    ///    producer re-queued it, so start over
    ///
    /// # Errors
    /// - `DataAvailableTimeout` if nothing was produced within the timeout
    /// - `SlotAcqTimeout` if the front slot could not be locked in time. The
    ///   queue is left as it was and the other waiters are woken so the slot
    ///   is not stranded.
    pub fn consume_next_available(&self) -> Result<ConsumeGuard<'_, T>, RingError> {
        loop {
            let slot = {
                let dirty = self.wait_for_data()?;
                match dirty.front() {
                    Some(&slot) => slot,
                    None => return Err(RingError::DataAvailableTimeout),
                }
            };

            let Some(item) = self.slots[slot].try_read_for(self.config.lock_timeout) else {
                self.data_available.notify_all();
                return Err(RingError::SlotAcqTimeout { slot: Some(slot) });
            };

            let mut dirty = self.dirty_slots.lock();
            if dirty.front() == Some(&slot) {
                dirty.pop_front();
                self.consumable.store(dirty.len(), Ordering::Release);
                return Ok(ConsumeGuard::new(self, slot, item));
            }
            trace!(slot, "front slot changed while locking, retrying");
        }
    }

    // ── Structural ──────────────────────────────────────────────────────────

    /// Discards every unconsumed slot and rewinds the write cursor to 0.
    ///
    /// Must only be called while no guard is outstanding; concurrent guards
    /// leave descriptors and queue inconsistent.
    ///
    /// # Errors
    /// `SlotAcqTimeout { slot: None }` if the structural lock is contended for
    /// the whole timeout window.
    pub fn clear(&self) -> Result<(), RingError> {
        let _structural = self.lock_structural()?;
        let mut dirty = self.dirty_slots.lock();
        dirty.clear();
        self.consumable.store(0, Ordering::Release);
        for state in self.states.iter() {
            state.mark_consumed();
        }
        self.write_cursor.store(0, Ordering::Release);
        debug!("slot ring cleared");
        Ok(())
    }

    /// Captures the status of every slot.
    ///
    /// Takes the structural lock (without a timeout) so the walk over the
    /// descriptors is not interleaved with a cursor advance or a `clear()`.
    pub fn snapshot(&self) -> RingSnapshot {
        let _structural = self.structural.lock();
        RingSnapshot {
            slots: self.states.iter().map(SlotState::status).collect(),
            consumable: self.num_consumable_slots(),
            write_cursor: self.write_cursor(),
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    /// Number of slots.
    #[inline]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Timeout applied to every blocking acquisition.
    #[inline]
    pub fn lock_timeout(&self) -> Duration {
        self.config.lock_timeout
    }

    /// True while a write guard is outstanding for `slot`. False if out of range.
    pub fn is_written(&self, slot: usize) -> bool {
        self.states.get(slot).is_some_and(SlotState::is_writing)
    }

    /// Number of outstanding read and consume guards for `slot`. 0 if out of range.
    pub fn num_concurrent_read(&self, slot: usize) -> usize {
        self.states.get(slot).map_or(0, SlotState::readers)
    }

    /// True while any read or consume guard is outstanding for `slot`.
    pub fn is_read(&self, slot: usize) -> bool {
        self.num_concurrent_read(slot) > 0
    }

    /// True if `slot` holds produced data that has not been consumed yet.
    pub fn is_dirty(&self, slot: usize) -> bool {
        self.states.get(slot).is_some_and(SlotState::is_dirty)
    }

    /// Number of queued slots. Informational only; may be stale on return.
    #[inline]
    pub fn num_consumable_slots(&self) -> usize {
        self.consumable.load(Ordering::Acquire)
    }

    /// Slot the next `write_next` will target.
    #[inline]
    pub fn write_cursor(&self) -> usize {
        self.write_cursor.load(Ordering::Acquire)
    }

    // ── Internals used by the guards ────────────────────────────────────────

    #[inline(always)]
    pub(crate) fn state(&self, slot: usize) -> &SlotState {
        &self.states[slot]
    }

    /// Write-guard release: marks `slot` dirty, queues it and wakes waiters.
    ///
    /// Runs while the releasing guard still holds the slot lock, so a consumer
    /// can only lock the slot once its queue position is final. An overwritten
    /// slot is moved to the back of the queue rather than queued twice.
    pub(crate) fn publish(&self, slot: usize, overwrote: bool) {
        let mut dirty = self.dirty_slots.lock();
        if overwrote {
            // With a single producer the stale entry is the oldest one.
            if dirty.front() == Some(&slot) {
                dirty.pop_front();
            } else if let Some(pos) = dirty.iter().position(|&queued| queued == slot) {
                dirty.remove(pos);
            }
        }
        self.states[slot].finish_write();
        dirty.push_back(slot);
        self.consumable.store(dirty.len(), Ordering::Release);
        drop(dirty);
        self.data_available.notify_all();
    }

    fn lock_structural(&self) -> Result<MutexGuard<'_, ()>, RingError> {
        self.structural
            .try_lock_for(self.config.lock_timeout)
            .ok_or(RingError::SlotAcqTimeout { slot: None })
    }

    /// Blocks until the dirty queue is non-empty.
    ///
    /// Each wait gets a fresh `now + lock_timeout` deadline; the condition is
    /// re-checked after every wakeup, spurious or not.
    fn wait_for_data(&self) -> Result<MutexGuard<'_, VecDeque<usize>>, RingError> {
        let mut dirty = self.dirty_slots.lock();
        while dirty.is_empty() {
            let waited = self
                .data_available
                .wait_for(&mut dirty, self.config.lock_timeout);
            if waited.timed_out() && dirty.is_empty() {
                return Err(RingError::DataAvailableTimeout);
            }
        }
        Ok(dirty)
    }
}

impl<T> fmt::Display for SlotRing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.snapshot())
    }
}

impl<T> fmt::Debug for SlotRing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotRing")
            .field("capacity", &self.size())
            .field("write_cursor", &self.write_cursor())
            .field("consumable", &self.num_consumable_slots())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
