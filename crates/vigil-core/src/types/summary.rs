//! Aggregated scan cycle results.
//!
//! This module provides [`ScanSummary`], the per-cycle counts returned to
//! whoever triggered the scan.

use serde::{Deserialize, Serialize};

use super::classification::Classification;

/// Aggregated counts for one completed scan cycle.
///
/// Every walked file lands in exactly one of `new`, `changed`, `unchanged`,
/// or `errors`; `total` is the number of files the cycle attempted.
///
/// # Examples
///
/// ```
/// use vigil_core::{Classification, ScanSummary};
///
/// let mut summary = ScanSummary::default();
/// summary.record(Classification::New);
/// summary.record(Classification::Changed);
///
/// assert_eq!(summary.total, 2);
/// assert_eq!(summary.new, 1);
/// assert!(summary.has_changes());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Total number of files the cycle attempted to process.
    pub total: u64,
    /// Number of files observed for the first time.
    pub new: u64,
    /// Number of files whose digest differed from the baseline.
    pub changed: u64,
    /// Number of files matching the baseline.
    pub unchanged: u64,
    /// Number of files that could not be processed.
    pub errors: u64,
}

impl ScanSummary {
    /// Records one classified file in the counts.
    pub fn record(&mut self, classification: Classification) {
        self.total += 1;
        match classification {
            Classification::New => self.new += 1,
            Classification::Unchanged => self.unchanged += 1,
            Classification::Changed => self.changed += 1,
        }
    }

    /// Records one file that failed to process.
    pub fn record_error(&mut self) {
        self.total += 1;
        self.errors += 1;
    }

    /// Returns `true` if the cycle detected any modification.
    ///
    /// New files establish a baseline and do not count as modifications.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_core::{Classification, ScanSummary};
    ///
    /// let mut summary = ScanSummary::default();
    /// summary.record(Classification::New);
    /// assert!(!summary.has_changes());
    ///
    /// summary.record(Classification::Changed);
    /// assert!(summary.has_changes());
    /// ```
    #[inline]
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.changed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_updates_counts() {
        let mut summary = ScanSummary::default();
        summary.record(Classification::New);
        summary.record(Classification::New);
        summary.record(Classification::Unchanged);
        summary.record(Classification::Changed);
        summary.record_error();

        assert_eq!(summary.total, 5);
        assert_eq!(summary.new, 2);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.changed, 1);
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn test_has_changes_ignores_new_files() {
        let mut summary = ScanSummary::default();
        summary.record(Classification::New);
        summary.record(Classification::Unchanged);
        assert!(!summary.has_changes());
    }

    #[test]
    fn test_summary_serde_round_trip() {
        let mut summary = ScanSummary::default();
        summary.record(Classification::Changed);
        let json = serde_json::to_string(&summary).unwrap();
        let parsed: ScanSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
    }
}
