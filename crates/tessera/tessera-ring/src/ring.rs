//! Ring configuration and cursor arithmetic.
//!
//! This module provides the foundational primitives for the slot ring:
//! - Configuration with capacity validation and the lock-timeout policy
//! - Wrapping advance of the write cursor

use std::time::Duration;

/// Lock timeout used when none is configured explicitly.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration for a slot ring.
///
/// Every blocking acquisition on the ring (slot locks, the structural lock and
/// the wait for available data) is bounded by `lock_timeout`.
#[derive(Debug, Copy, Clone)]
pub struct RingConfig {
    /// Number of slots in the ring. Must be non-zero.
    pub capacity: usize,
    /// Upper bound for every blocking acquisition.
    pub lock_timeout: Duration,
    /// Hold the structural lock across the whole write acquisition, including
    /// the initial cursor read.
    ///
    /// Concurrent writers then get distinct slots, but ordering between them
    /// is unspecified.
    pub serialize_writers: bool,
}

impl RingConfig {
    /// Creates a new ring configuration with the specified capacity and the
    /// default one second lock timeout.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    ///
    /// # Example
    /// ```
    /// use tessera_ring::RingConfig;
    /// let cfg = RingConfig::new(10);
    /// assert_eq!(cfg.lock_timeout.as_secs(), 1);
    /// // RingConfig::new(0);  // Would panic: a ring needs at least one slot
    /// ```
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be non-zero");
        Self {
            capacity,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            serialize_writers: false,
        }
    }

    /// Replaces the timeout applied to every blocking acquisition.
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Enables or disables serialized write acquisition.
    pub fn with_serialized_writers(mut self, serialize_writers: bool) -> Self {
        self.serialize_writers = serialize_writers;
        self
    }
}

/// Advances a write cursor by one slot, wrapping at `capacity`.
///
/// # Examples
///
/// With `capacity = 3`:
/// ```text
/// cursor = 0 → 1
/// cursor = 1 → 2
/// cursor = 2 → 0  (wraps around)
/// ```
#[inline(always)]
pub fn next_index(cursor: usize, capacity: usize) -> usize {
    let next = cursor + 1;
    if next == capacity { 0 } else { next }
}
