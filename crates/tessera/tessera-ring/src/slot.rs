//! Per-slot descriptors and their diagnostic rendering.
//!
//! Each slot of the ring owns one [`SlotState`]. The descriptors live in one
//! contiguous boxed slice indexed by slot number, parallel to the item storage.
//!
//! # Field Semantics
//!
//! - `writing`: a write guard is outstanding for the slot
//! - `readers`: number of outstanding read and consume guards
//! - `dirty`: the slot holds data that was produced but not yet consumed
//!
//! `writing` and `readers > 0` are mutually exclusive; the slot's
//! reader/writer lock enforces it, the descriptor only records it.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Bookkeeping for one slot.
///
/// Fields are atomics because shared holders of the same slot update
/// `readers` concurrently. Mutation only happens while the slot lock is held
/// (or during guard release), so the orderings only need to publish the
/// values to the status queries.
#[derive(Debug, Default)]
pub(crate) struct SlotState {
    writing: AtomicBool,
    readers: AtomicUsize,
    dirty: AtomicBool,
}

impl SlotState {
    #[inline]
    pub(crate) fn is_writing(&self) -> bool {
        self.writing.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn readers(&self) -> usize {
        self.readers.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn begin_write(&self) {
        self.writing.store(true, Ordering::Release);
    }

    /// Marks the write finished and the slot as holding unconsumed data.
    #[inline]
    pub(crate) fn finish_write(&self) {
        self.dirty.store(true, Ordering::Release);
        self.writing.store(false, Ordering::Release);
    }

    #[inline]
    pub(crate) fn add_reader(&self) {
        self.readers.fetch_add(1, Ordering::AcqRel);
    }

    #[inline]
    pub(crate) fn remove_reader(&self) {
        // Guards pair every add with exactly one remove, so this never underflows.
        self.readers.fetch_sub(1, Ordering::AcqRel);
    }

    #[inline]
    pub(crate) fn mark_consumed(&self) {
        self.dirty.store(false, Ordering::Release);
    }

    pub(crate) fn status(&self) -> SlotStatus {
        if self.is_writing() {
            return SlotStatus::Writing;
        }
        match self.readers() {
            0 if self.is_dirty() => SlotStatus::Dirty,
            0 => SlotStatus::Idle,
            n => SlotStatus::Reading(n),
        }
    }
}

/// Observable state of a single slot, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    /// A write guard is outstanding.
    Writing,
    /// This many read or consume guards are outstanding.
    Reading(usize),
    /// Produced and not yet consumed.
    Dirty,
    /// Nothing to report.
    Idle,
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotStatus::Writing => f.write_str(" W "),
            SlotStatus::Reading(n) => write!(f, "{n}R "),
            SlotStatus::Dirty => f.write_str(" X "),
            SlotStatus::Idle => f.write_str(" . "),
        }
    }
}

/// Point-in-time view of every slot, taken under the structural lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingSnapshot {
    pub slots: Vec<SlotStatus>,
    pub consumable: usize,
    pub write_cursor: usize,
}

impl fmt::Display for RingSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[ ")?;
        for status in &self.slots {
            write!(f, "{status}")?;
        }
        f.write_str(" ]")
    }
}
