//! Error types for the vigil-store crate.

use camino::Utf8PathBuf;
use vigil_core::DigestParseError;

/// Errors that can occur in the persistence layer.
///
/// Any of these aborts the current scan cycle; per-path upserts are
/// transactional, so the store stays consistent and the next scheduled
/// cycle simply retries.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database file could not be opened or initialized.
    #[error("failed to open state database {path}: {source}")]
    Open {
        /// The database path that failed to open.
        path: Utf8PathBuf,
        /// The underlying SQLite error.
        #[source]
        source: rusqlite::Error,
    },

    /// A query or statement failed.
    #[error("state database query failed: {0}")]
    Sql(#[from] rusqlite::Error),

    /// A stored digest column did not decode as 64 hex characters.
    ///
    /// Indicates external tampering with or corruption of the database.
    #[error("corrupt digest stored for {path}: {source}")]
    CorruptDigest {
        /// The path whose record is corrupt.
        path: Utf8PathBuf,
        /// The digest decoding failure.
        #[source]
        source: DigestParseError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_digest_display() {
        let error = StoreError::CorruptDigest {
            path: Utf8PathBuf::from("/watched/a.txt"),
            source: DigestParseError::Length(10),
        };
        let msg = error.to_string();
        assert!(msg.contains("/watched/a.txt"));
        assert!(msg.contains("corrupt"));
    }
}
