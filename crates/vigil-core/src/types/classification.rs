//! Per-file diff outcomes.
//!
//! This module provides the [`Classification`] enum describing the result of
//! comparing a freshly computed digest against the stored baseline.

use serde::{Deserialize, Serialize};

/// The outcome of diffing one file against the baseline.
///
/// Produced by the state store's upsert operation and aggregated into a
/// [`ScanSummary`](crate::ScanSummary) per scan cycle.
///
/// # Examples
///
/// ```
/// use vigil_core::Classification;
///
/// let outcome = Classification::Changed;
/// assert!(outcome.is_changed());
///
/// let outcome = Classification::New;
/// assert!(!outcome.is_changed());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// The path was observed for the first time; a baseline record was created.
    New,

    /// The stored digest matches the freshly computed one.
    Unchanged,

    /// The stored digest differs; the baseline record was overwritten.
    ///
    /// This is the only classification that produces a change notification.
    Changed,
}

impl Classification {
    /// Returns `true` if this outcome represents a modified file.
    ///
    /// First observations are not modifications: a `New` file establishes
    /// the baseline and never triggers a notification.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_core::Classification;
    ///
    /// assert!(Classification::Changed.is_changed());
    /// assert!(!Classification::New.is_changed());
    /// assert!(!Classification::Unchanged.is_changed());
    /// ```
    #[inline]
    #[must_use]
    pub const fn is_changed(self) -> bool {
        matches!(self, Self::Changed)
    }

    /// Returns a short lowercase label for display and CSV output.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Unchanged => "unchanged",
            Self::Changed => "changed",
        }
    }
}
