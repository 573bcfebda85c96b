//! Error types for the vigil-scanner crate.
//!
//! This module provides the [`ScanError`] type for errors that can occur
//! during directory traversal, fingerprinting, and diffing.

use camino::Utf8PathBuf;
use vigil_store::StoreError;

/// Errors that can occur during scanning operations.
///
/// These errors cover directory traversal failures, file I/O errors,
/// persistence failures, and configuration issues.
///
/// # Error Recovery Strategy
///
/// - **Walk errors** ([`ScanError::Walk`]): per-entry - log, count, continue
/// - **File read errors** ([`ScanError::Read`]): log, count, skip file, continue
/// - **Store errors** ([`ScanError::Store`]): fatal - abort the cycle, retry next tick
/// - **Config errors** ([`ScanError::Config`]): fatal - the root is unusable
///
/// # Examples
///
/// ```
/// use vigil_scanner::ScanError;
///
/// fn handle_error(err: &ScanError) {
///     if err.is_recoverable() {
///         eprintln!("skipping: {err}");
///     } else {
///         eprintln!("aborting scan: {err}");
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Failed to enumerate a directory entry.
    ///
    /// Scanning can continue with the remaining entries.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// Failed to open or read a file.
    ///
    /// Contains the path that failed and the underlying I/O error.
    /// Scanning can continue by skipping this file.
    #[error("failed to read file {path}: {source}")]
    Read {
        /// The path of the file that couldn't be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The baseline store failed.
    ///
    /// Aborts the current cycle; per-path upserts are transactional, so the
    /// store stays consistent and the next scheduled cycle retries.
    #[error("state store failure: {0}")]
    Store(#[from] StoreError),

    /// Invalid scanner configuration.
    ///
    /// Indicates that the scanner was configured with an unusable root.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A path is not valid UTF-8.
    ///
    /// This workspace uses UTF-8 paths throughout. A non-UTF-8 entry is
    /// reported and skipped.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// The scan was cancelled before completing.
    ///
    /// Files processed before the cancellation point keep their store
    /// updates.
    #[error("scan cancelled before completion")]
    Cancelled,
}

impl ScanError {
    /// Creates a new [`ScanError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Config`] error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` if this error is recoverable (scanning can continue).
    ///
    /// Recoverable errors are entry-specific issues that don't prevent
    /// scanning other files.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Walk(_) | Self::NonUtf8Path(_))
    }

    /// Returns `true` if this error is fatal (the cycle should stop).
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Read { path, .. } => Some(path),
            _ => None,
        }
    }
}
