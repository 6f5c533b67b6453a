//! Per-file observation records and scan cycle identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rfs_core::FxHashMap;
use serde::{Deserialize, Serialize};

/// Identifier of one scan pass.
///
/// Cycle ids are minted from a process-local monotonic counter; a
/// record whose `last_seen` is older than the current cycle after a
/// full traversal names a removed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleId(u64);

impl CycleId {
    /// Returns the raw counter value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cycle#{}", self.0)
    }
}

/// Monotonic mint for [`CycleId`]s.
#[derive(Debug, Default)]
pub struct CycleCounter {
    next: AtomicU64,
}

impl CycleCounter {
    /// Creates a counter starting at cycle 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Mints the next cycle id. Never returns the same id twice.
    #[must_use]
    pub fn mint(&self) -> CycleId {
        CycleId(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// What a previous scan remembered about one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRecord {
    /// Byte size at the last observation.
    pub size: u64,
    /// Cycle the file was last observed in.
    pub last_seen: CycleId,
}

impl FileRecord {
    /// Creates a record for a file observed in `cycle`.
    #[must_use]
    pub const fn observed(size: u64, cycle: CycleId) -> Self {
        Self {
            size,
            last_seen: cycle,
        }
    }

    /// Returns `true` when the record was not refreshed by `cycle`.
    #[inline]
    #[must_use]
    pub fn is_stale(&self, cycle: CycleId) -> bool {
        self.last_seen < cycle
    }
}

/// Full-path to record map for one watch.
pub type RecordMap = FxHashMap<String, FileRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_is_monotonic() {
        let counter = CycleCounter::new();
        let a = counter.mint();
        let b = counter.mint();
        let c = counter.mint();
        assert!(a < b && b < c);
        assert_eq!(a.value(), 1);
    }

    #[test]
    fn test_record_staleness() {
        let counter = CycleCounter::new();
        let first = counter.mint();
        let record = FileRecord::observed(42, first);
        assert!(!record.is_stale(first));

        let second = counter.mint();
        assert!(record.is_stale(second));

        let refreshed = FileRecord::observed(42, second);
        assert!(!refreshed.is_stale(second));
    }

    #[test]
    fn test_cycle_display() {
        let counter = CycleCounter::new();
        assert_eq!(counter.mint().to_string(), "cycle#1");
    }
}
