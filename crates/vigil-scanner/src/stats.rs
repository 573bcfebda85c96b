//! Live scan statistics with atomic counters.
//!
//! This module provides [`ScanStats`], the counters a reporting
//! collaborator can read while a scan cycle is still in flight.
//!
//! # Thread Safety
//!
//! All counters use [`AtomicU64`] with relaxed ordering. Statistics are for
//! informational purposes and don't require strict ordering guarantees.
//!
//! # Examples
//!
//! ```
//! use vigil_scanner::ScanStats;
//! use vigil_core::Classification;
//!
//! let stats = ScanStats::new();
//! stats.record(Classification::New);
//! stats.record(Classification::Changed);
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.total, 2);
//! assert_eq!(snapshot.changed, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use vigil_core::{Classification, ScanSummary};

/// Atomic counters for the current scan cycle.
///
/// Shared via `Arc` between the diff engine (writer) and any reporting
/// reader. Reset at the start of each cycle; snapshot at any point for a
/// consistent-enough view of progress.
#[derive(Debug, Default)]
pub struct ScanStats {
    /// Total number of files processed so far.
    total: AtomicU64,
    /// Files observed for the first time.
    new: AtomicU64,
    /// Files whose digest differed from the baseline.
    changed: AtomicU64,
    /// Files matching the baseline.
    unchanged: AtomicU64,
    /// Files that failed to process.
    errors: AtomicU64,
}

impl ScanStats {
    /// Creates a new [`ScanStats`] with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one classified file.
    pub fn record(&self, classification: Classification) {
        self.total.fetch_add(1, Ordering::Relaxed);
        match classification {
            Classification::New => self.new.fetch_add(1, Ordering::Relaxed),
            Classification::Unchanged => self.unchanged.fetch_add(1, Ordering::Relaxed),
            Classification::Changed => self.changed.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Records one file that failed to process.
    pub fn record_error(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of the counters.
    ///
    /// The values are read at approximately the same time; due to relaxed
    /// ordering they may not reflect a perfectly consistent state mid-scan.
    #[must_use]
    pub fn snapshot(&self) -> ScanSummary {
        ScanSummary {
            total: self.total.load(Ordering::Relaxed),
            new: self.new.load(Ordering::Relaxed),
            changed: self.changed.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    /// Resets all counters to zero for a fresh cycle.
    pub fn reset(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.new.store(0, Ordering::Relaxed);
        self.changed.store(0, Ordering::Relaxed);
        self.unchanged.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let stats = ScanStats::new();
        stats.record(Classification::New);
        stats.record(Classification::Unchanged);
        stats.record(Classification::Changed);
        stats.record_error();

        let snap = stats.snapshot();
        assert_eq!(snap.total, 4);
        assert_eq!(snap.new, 1);
        assert_eq!(snap.unchanged, 1);
        assert_eq!(snap.changed, 1);
        assert_eq!(snap.errors, 1);
    }

    #[test]
    fn test_reset_zeroes_counters() {
        let stats = ScanStats::new();
        stats.record(Classification::New);
        stats.reset();
        assert_eq!(stats.snapshot(), ScanSummary::default());
    }
}
