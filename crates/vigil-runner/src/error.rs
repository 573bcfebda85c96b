//! Error types for the vigil-runner crate.

use std::sync::Arc;

use vigil_scanner::ScanError;

/// Errors surfaced to whoever triggered or scheduled a scan cycle.
///
/// Cloneable so that one cycle's outcome can be shared with every caller
/// coalesced onto it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RunnerError {
    /// A scan is already in flight and the overlap policy is `reject`.
    ///
    /// The caller may retry once the runner returns to idle.
    #[error("a scan is already in progress")]
    ScanInProgress,

    /// The scan exceeded its configured deadline and was abandoned.
    ///
    /// Files processed before the deadline keep their baseline updates.
    #[error("scan abandoned after exceeding its deadline")]
    Timeout,

    /// The scan itself failed with a root-level error.
    #[error("scan failed: {0}")]
    Scan(Arc<ScanError>),

    /// The scan task terminated without producing a result.
    #[error("scan task terminated unexpectedly")]
    TaskFailed,
}

impl From<ScanError> for RunnerError {
    fn from(error: ScanError) -> Self {
        Self::Scan(Arc::new(error))
    }
}
