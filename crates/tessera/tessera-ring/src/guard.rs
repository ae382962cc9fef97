//! Scoped access guards.
//!
//! A guard is the only way to touch a slot's item. It owns the slot lock for
//! its whole lifetime and performs the slot's release bookkeeping exactly once,
//! when dropped:
//!
//! | Guard | Lock | On acquire | On release |
//! |---|---|---|---|
//! | [`WriteGuard`] | exclusive | `writing = true` | `writing = false`, `dirty = true`, slot queued, consumers woken |
//! | [`ReadGuard`] | shared | `readers += 1` | `readers -= 1` |
//! | [`ConsumeGuard`] | shared | `readers += 1` | `readers -= 1`, `dirty = false` |
//!
//! Guards borrow the ring, so a guard can neither outlive it nor be used after
//! release. They are not `Clone`; moving a guard moves the permission.

use crate::buffer::SlotRing;
use crate::error::RingError;
use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::ops::{Deref, DerefMut};
use tracing::trace;

/// Exclusive access to the slot being produced.
pub struct WriteGuard<'a, T> {
    ring: &'a SlotRing<T>,
    slot: usize,
    /// The slot still held unconsumed data when it was acquired.
    overwrote: bool,
    /// False when the structural lock timed out after the slot was granted.
    cursor_advanced: bool,
    item: RwLockWriteGuard<'a, T>,
}

/// Shared, non-consuming access to a slot.
pub struct ReadGuard<'a, T> {
    ring: &'a SlotRing<T>,
    slot: usize,
    item: RwLockReadGuard<'a, T>,
}

/// Shared access to the oldest produced slot; consumes it on release.
pub struct ConsumeGuard<'a, T> {
    ring: &'a SlotRing<T>,
    slot: usize,
    item: RwLockReadGuard<'a, T>,
}

impl<'a, T> WriteGuard<'a, T> {
    pub(crate) fn new(
        ring: &'a SlotRing<T>,
        slot: usize,
        overwrote: bool,
        item: RwLockWriteGuard<'a, T>,
    ) -> Self {
        ring.state(slot).begin_write();
        trace!(slot, overwrote, "write access granted");
        Self {
            ring,
            slot,
            overwrote,
            cursor_advanced: true,
            item,
        }
    }

    pub(crate) fn with_cursor_stalled(mut self) -> Self {
        self.cursor_advanced = false;
        self
    }

    /// Index of the slot this guard is bound to.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Whether the write cursor moved past this slot.
    #[inline]
    pub fn cursor_advanced(&self) -> bool {
        self.cursor_advanced
    }

    /// The structural-lock timeout that kept the cursor in place, if any.
    /// Write access is unaffected; the next write targets this slot again.
    pub fn cursor_error(&self) -> Option<RingError> {
        (!self.cursor_advanced).then_some(RingError::SlotAcqTimeout { slot: None })
    }
}

impl<'a, T> ReadGuard<'a, T> {
    pub(crate) fn new(ring: &'a SlotRing<T>, slot: usize, item: RwLockReadGuard<'a, T>) -> Self {
        ring.state(slot).add_reader();
        trace!(slot, "read access granted");
        Self { ring, slot, item }
    }

    /// Index of the slot this guard is bound to.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl<'a, T> ConsumeGuard<'a, T> {
    pub(crate) fn new(ring: &'a SlotRing<T>, slot: usize, item: RwLockReadGuard<'a, T>) -> Self {
        ring.state(slot).add_reader();
        trace!(slot, "consume access granted");
        Self { ring, slot, item }
    }

    /// Index of the slot this guard is bound to.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.item
    }
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T> Deref for ConsumeGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.item
    }
}

// Release bookkeeping runs in the drop body, before the `item` field (and
// with it the slot lock) is dropped.

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        self.ring.publish(self.slot, self.overwrote);
        trace!(slot = self.slot, "write access released, dirty slot produced");
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.ring.state(self.slot).remove_reader();
        trace!(slot = self.slot, "read access released");
    }
}

impl<T> Drop for ConsumeGuard<'_, T> {
    fn drop(&mut self) {
        let state = self.ring.state(self.slot);
        state.mark_consumed();
        state.remove_reader();
        trace!(slot = self.slot, "consume access released, dirty slot consumed");
    }
}

impl<T> fmt::Debug for WriteGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteGuard")
            .field("slot", &self.slot)
            .field("overwrote", &self.overwrote)
            .field("cursor_advanced", &self.cursor_advanced)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Debug for ReadGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadGuard")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Debug for ConsumeGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumeGuard")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}
