//! Persisted baseline records.
//!
//! This module provides [`FileRecord`], the last-observed state of one
//! monitored file as held by the state store.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use super::digest::Digest;

/// The last-observed state of one monitored file.
///
/// A record is created the first time a path is observed by a completed
/// scan and its digest is overwritten whenever a later scan computes a
/// different one. Records are never deleted when a file disappears from
/// disk; the path simply stops being re-observed and `last_seen_at` goes
/// stale.
///
/// # Examples
///
/// ```
/// use vigil_core::{Digest, FileRecord};
/// use camino::Utf8PathBuf;
///
/// let record = FileRecord::new(
///     Utf8PathBuf::from("/etc/passwd"),
///     Digest::from_bytes([0u8; 32]),
///     1_700_000_000,
/// );
/// assert_eq!(record.path, "/etc/passwd");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Canonical path of the monitored file; unique key in the store.
    pub path: Utf8PathBuf,

    /// Content digest computed at the most recent scan observing this path.
    pub digest: Digest,

    /// Unix seconds of the last completed scan that touched this record.
    pub last_seen_at: i64,
}

impl FileRecord {
    /// Creates a new baseline record.
    #[inline]
    #[must_use]
    pub const fn new(path: Utf8PathBuf, digest: Digest, last_seen_at: i64) -> Self {
        Self {
            path,
            digest,
            last_seen_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serde_round_trip() {
        let record = FileRecord::new(
            Utf8PathBuf::from("/watched/a.txt"),
            Digest::from_bytes([3u8; 32]),
            1_700_000_000,
        );
        let json = serde_json::to_string(&record).unwrap();
        let parsed: FileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
