/// Failures reported by the slot ring's acquisition and structural operations.
///
/// All variants are recoverable. The ring never retries internally; whether to
/// try again is the caller's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    /// A slot lock, or the structural lock when `slot` is `None`, was not
    /// acquired before the lock timeout expired.
    #[error("timed out acquiring {}", lock_name(.slot))]
    SlotAcqTimeout { slot: Option<usize> },

    /// No produced-and-unconsumed slot appeared before the lock timeout expired.
    #[error("timed out waiting for available data")]
    DataAvailableTimeout,

    /// The caller supplied a slot index outside `0..capacity`.
    #[error("slot {slot} is out of range for a ring of {capacity} slots")]
    InvalidSlot { slot: usize, capacity: usize },
}

fn lock_name(slot: &Option<usize>) -> String {
    match slot {
        Some(slot) => format!("slot {slot}"),
        None => "the structural lock".to_string(),
    }
}

impl RingError {
    /// Returns true for either timeout variant.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            RingError::SlotAcqTimeout { .. } | RingError::DataAvailableTimeout
        )
    }
}
