//! Fetch sequence numbers

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic tags for overlapping fetches
///
/// Each fetch takes a number from [`FetchSequencer::next`]; a response may
/// only be applied while its number is still the latest one handed out.
#[derive(Debug, Default)]
pub struct FetchSequencer {
    latest: AtomicU64,
}

impl FetchSequencer {
    /// Create a sequencer that has issued nothing yet
    pub const fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
        }
    }

    /// Issue the next sequence number, starting at 1
    pub fn next(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last issued number, 0 if none
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Whether `sequence` is still the most recent fetch
    pub fn is_latest(&self, sequence: u64) -> bool {
        self.latest() == sequence
    }
}
