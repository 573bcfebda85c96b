//! Scan-and-diff engine for the vigil file integrity monitor.
//!
//! This crate walks a monitored root, fingerprints every regular file, and
//! diffs each fingerprint against the durable baseline held by
//! `vigil-store`. Files whose content changed since the last cycle are
//! handed to the change notifier.
//!
//! # Overview
//!
//! The main entry point is [`Scanner`], which combines:
//!
//! - [`FileWalker`]: deterministic directory traversal
//! - [`fingerprint`]: streaming SHA-256 content digests
//! - [`StateStore`](vigil_store::StateStore): the persisted baseline
//! - [`ScanStats`]: atomic statistics readable mid-scan
//! - [`ChannelNotifier`]: non-blocking change event handoff
//!
//! # Architecture
//!
//! ```text
//! Scanner (diff engine)
//!     │
//!     ├── FileWalker (collect + sort paths)
//!     │
//!     ├── fingerprint (streaming SHA-256, per file)
//!     │
//!     ├── StateStore.upsert (atomic classify: new/unchanged/changed)
//!     │
//!     ├── ScanStats (atomic counters)
//!     │
//!     └── ChangeNotifier.file_changed (Changed only, fire-and-forget)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vigil_core::{NullNotifier, ScanConfig};
//! use vigil_scanner::Scanner;
//! use vigil_store::StateStore;
//! use tokio_util::sync::CancellationToken;
//!
//! let store = Arc::new(StateStore::open_in_memory()?);
//! let config = ScanConfig { root_path: "/watched".into(), ..ScanConfig::default() };
//! let scanner = Scanner::new(config, store, Arc::new(NullNotifier))?;
//!
//! let report = scanner.scan(&CancellationToken::new())?;
//! println!("{} new, {} changed", report.summary.new, report.summary.changed);
//! ```
//!
//! # Determinism
//!
//! Given an unchanged filesystem and baseline, repeated scans are
//! idempotent: every file classifies `Unchanged` and the store is left
//! untouched apart from `last_seen_at` refreshes.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod fingerprint;
mod notify;
mod stats;
mod walker;

pub use error::ScanError;
pub use fingerprint::fingerprint;
pub use notify::ChannelNotifier;
pub use stats::ScanStats;
pub use walker::{FileWalker, Walked};

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use camino::Utf8PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vigil_core::{ChangeNotifier, Classification, FileChange, ScanConfig, ScanSummary};
use vigil_store::StateStore;

/// Result of one scan cycle.
///
/// Contains the aggregated counts, the per-file findings worth surfacing
/// (everything that was not `Unchanged`), and any non-fatal errors.
#[derive(Debug)]
pub struct ScanReport {
    /// Aggregated counts for the cycle.
    pub summary: ScanSummary,
    /// Paths that were newly observed or changed, in detection order.
    pub findings: Vec<(Utf8PathBuf, Classification)>,
    /// Non-fatal errors encountered during the cycle.
    pub errors: Vec<ScanError>,
}

/// The diff engine: fingerprints a monitored tree and diffs it against the
/// persisted baseline.
///
/// # Cloning
///
/// `Scanner` is cheaply cloneable via internal `Arc` references. Clones
/// share the same store, statistics, and notifier, enabling use from a
/// background scheduler task while callers read statistics.
#[derive(Clone)]
pub struct Scanner {
    /// Scanner configuration.
    config: ScanConfig,
    /// Persisted baseline (shared, explicitly constructed at startup).
    store: Arc<StateStore>,
    /// Change event sink.
    notifier: Arc<dyn ChangeNotifier>,
    /// Statistics counters (shared via Arc for mid-scan reads).
    stats: Arc<ScanStats>,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl Scanner {
    /// Creates a new scanner over the configured root.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the root doesn't exist or isn't a
    /// directory.
    pub fn new(
        config: ScanConfig,
        store: Arc<StateStore>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Result<Self, ScanError> {
        if !config.root_path.exists() {
            return Err(ScanError::config(format!(
                "root path does not exist: {}",
                config.root_path
            )));
        }
        if !config.root_path.is_dir() {
            return Err(ScanError::config(format!(
                "root path is not a directory: {}",
                config.root_path
            )));
        }

        info!(
            root = %config.root_path,
            recursive = config.recursive,
            "Creating scanner"
        );

        Ok(Self {
            config,
            store,
            notifier,
            stats: Arc::new(ScanStats::new()),
        })
    }

    /// Performs one full scan cycle.
    ///
    /// This method:
    /// 1. Walks the root to collect the sorted file list
    /// 2. Fingerprints each file with a streaming SHA-256
    /// 3. Upserts each digest into the baseline, classifying the result
    /// 4. Hands `Changed` files to the notifier, in detection order
    ///
    /// Per-file read failures are logged, counted, and skipped; the cycle
    /// continues. A store failure aborts the cycle. Cancellation is
    /// checked once per file, never mid-read; files already processed keep
    /// their baseline updates.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Store`] if the baseline fails,
    /// [`ScanError::Cancelled`] if the token fired, or the root-level
    /// walk/config error that made the cycle impossible.
    pub fn scan(&self, cancel: &CancellationToken) -> Result<ScanReport, ScanError> {
        info!(root = %self.config.root_path, "Starting scan");

        // Fresh counters for this cycle
        self.stats.reset();

        let walker = self.build_walker()?;
        let walked = walker.collect_paths();

        info!(count = walked.paths.len(), "Collected files");

        let mut summary = ScanSummary::default();
        let mut findings = Vec::new();
        let mut errors = Vec::new();

        for error in walked.errors {
            warn!(error = %error, "Failed to enumerate entry");
            summary.record_error();
            self.stats.record_error();
            errors.push(error);
        }

        for path in walked.paths {
            if cancel.is_cancelled() {
                info!(
                    processed = summary.total,
                    "Scan cancelled between files"
                );
                return Err(ScanError::Cancelled);
            }

            match self.scan_one(&path) {
                Ok(classification) => {
                    summary.record(classification);
                    self.stats.record(classification);
                    if classification != Classification::Unchanged {
                        findings.push((path, classification));
                    }
                }
                Err(e) if e.is_recoverable() => {
                    warn!(path = %path, error = %e, "Failed to scan file");
                    summary.record_error();
                    self.stats.record_error();
                    errors.push(e);
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            total = summary.total,
            new = summary.new,
            changed = summary.changed,
            unchanged = summary.unchanged,
            errors = summary.errors,
            "Scan completed"
        );

        Ok(ScanReport {
            summary,
            findings,
            errors,
        })
    }

    /// Fingerprints and diffs a single file against the baseline.
    ///
    /// On a `Changed` classification the notifier receives the old/new
    /// digest pair, fire-and-forget. First observations never notify.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Read`] if the file cannot be read (recoverable)
    /// or [`ScanError::Store`] if the upsert fails (fatal for the cycle).
    pub fn scan_one(&self, path: &camino::Utf8Path) -> Result<Classification, ScanError> {
        let digest = fingerprint(path)?;
        let upsert = self.store.upsert(path, &digest, unix_now())?;

        debug!(
            path = %path,
            classification = upsert.classification.label(),
            "Diffed file"
        );

        if let (Classification::Changed, Some(previous)) =
            (upsert.classification, upsert.previous)
        {
            warn!(
                path = %path,
                old_digest = %previous,
                new_digest = %digest,
                "Change detected"
            );
            self.notifier.file_changed(FileChange {
                path: path.to_owned(),
                old_digest: previous,
                new_digest: digest,
            });
        }

        Ok(upsert.classification)
    }

    /// Returns a snapshot of the current cycle's statistics.
    ///
    /// Safe to call from another task while a scan is in flight.
    #[must_use]
    pub fn stats(&self) -> ScanSummary {
        self.stats.snapshot()
    }

    /// Returns the scanner configuration.
    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Returns the shared baseline store handle.
    #[must_use]
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Builds a file walker with the current configuration.
    fn build_walker(&self) -> Result<FileWalker, ScanError> {
        let mut walker = FileWalker::new(&self.config.root_path)?
            .with_recursive(self.config.recursive)
            .with_follow_links(self.config.follow_links);

        if !self.config.skip_dirs.is_empty() {
            let skip_dirs: Vec<&str> =
                self.config.skip_dirs.iter().map(String::as_str).collect();
            walker = walker.with_skip_dirs(&skip_dirs);
        }

        Ok(walker)
    }
}

/// Current wall-clock time as unix seconds.
fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;

    use camino::Utf8Path;
    use vigil_core::{Digest, NullNotifier};

    /// Records every change event for assertion.
    #[derive(Debug, Default)]
    struct RecordingNotifier {
        changes: Mutex<Vec<FileChange>>,
    }

    impl ChangeNotifier for RecordingNotifier {
        fn file_changed(&self, change: FileChange) {
            self.changes.lock().unwrap().push(change);
        }
    }

    fn setup_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        fs::write(root.join("a.txt"), "hello").unwrap();
        fs::write(root.join("b.txt"), "world").unwrap();
        (dir, root)
    }

    fn scanner_with(
        root: &Utf8Path,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Scanner {
        let config = ScanConfig {
            root_path: root.to_owned(),
            ..ScanConfig::default()
        };
        let store = Arc::new(StateStore::open_in_memory().unwrap());
        Scanner::new(config, store, notifier).unwrap()
    }

    #[test]
    fn test_first_scan_classifies_all_new() {
        let (_dir, root) = setup_root();
        let notifier = Arc::new(RecordingNotifier::default());
        let scanner = scanner_with(&root, Arc::clone(&notifier) as Arc<dyn ChangeNotifier>);

        let report = scanner.scan(&CancellationToken::new()).unwrap();

        assert_eq!(report.summary.new, 2);
        assert_eq!(report.summary.changed, 0);
        assert_eq!(report.summary.unchanged, 0);
        assert_eq!(report.summary.errors, 0);
        assert_eq!(scanner.store().len().unwrap(), 2);

        // First observations establish the baseline, never notify
        assert!(notifier.changes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_modification_is_detected_and_notified_once() {
        let (_dir, root) = setup_root();
        let notifier = Arc::new(RecordingNotifier::default());
        let scanner = scanner_with(&root, Arc::clone(&notifier) as Arc<dyn ChangeNotifier>);

        scanner.scan(&CancellationToken::new()).unwrap();
        fs::write(root.join("a.txt"), "hello!").unwrap();

        let report = scanner.scan(&CancellationToken::new()).unwrap();
        assert_eq!(report.summary.new, 0);
        assert_eq!(report.summary.changed, 1);
        assert_eq!(report.summary.unchanged, 1);

        let changes = notifier.changes.lock().unwrap();
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert!(change.path.as_str().ends_with("a.txt"));
        assert_ne!(change.old_digest, change.new_digest);

        // The baseline now holds the new digest
        let record = scanner.store().get(&change.path).unwrap().unwrap();
        assert_eq!(record.digest, change.new_digest);
    }

    #[test]
    fn test_deleted_file_record_remains() {
        let (_dir, root) = setup_root();
        let scanner = scanner_with(&root, Arc::new(NullNotifier));

        scanner.scan(&CancellationToken::new()).unwrap();
        fs::remove_file(root.join("b.txt")).unwrap();

        let report = scanner.scan(&CancellationToken::new()).unwrap();
        assert_eq!(report.summary.total, 1);
        assert_eq!(report.summary.unchanged, 1);
        assert_eq!(report.summary.changed, 0);

        // No tombstones: the stale record stays behind
        assert_eq!(scanner.store().len().unwrap(), 2);
    }

    #[test]
    fn test_repeated_scans_are_idempotent() {
        let (_dir, root) = setup_root();
        let scanner = scanner_with(&root, Arc::new(NullNotifier));

        scanner.scan(&CancellationToken::new()).unwrap();
        let before = scanner.store().all_records().unwrap();

        let report = scanner.scan(&CancellationToken::new()).unwrap();
        assert_eq!(report.summary.changed, 0);
        assert_eq!(report.summary.new, 0);
        assert_eq!(report.summary.unchanged, 2);

        let after = scanner.store().all_records().unwrap();
        let digests = |records: &[vigil_core::FileRecord]| -> Vec<Digest> {
            records.iter().map(|r| r.digest).collect()
        };
        assert_eq!(digests(&before), digests(&after));
    }

    #[test]
    fn test_findings_list_new_and_changed_only() {
        let (_dir, root) = setup_root();
        let scanner = scanner_with(&root, Arc::new(NullNotifier));

        let report = scanner.scan(&CancellationToken::new()).unwrap();
        assert_eq!(report.findings.len(), 2);

        fs::write(root.join("a.txt"), "patched").unwrap();
        let report = scanner.scan(&CancellationToken::new()).unwrap();
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].1, Classification::Changed);
    }

    #[test]
    fn test_cancelled_token_aborts_between_files() {
        let (_dir, root) = setup_root();
        let scanner = scanner_with(&root, Arc::new(NullNotifier));

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = scanner.scan(&cancel).unwrap_err();
        assert!(matches!(err, ScanError::Cancelled));
        // Nothing was processed before the first cancellation check
        assert!(scanner.store().is_empty().unwrap());
    }

    #[test]
    fn test_scan_one_missing_file_is_recoverable() {
        let (_dir, root) = setup_root();
        let scanner = scanner_with(&root, Arc::new(NullNotifier));

        let err = scanner.scan_one(&root.join("nope.txt")).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_scanner_rejects_missing_root() {
        let store = Arc::new(StateStore::open_in_memory().unwrap());
        let config = ScanConfig {
            root_path: Utf8PathBuf::from("/nonexistent/path/that/does/not/exist"),
            ..ScanConfig::default()
        };
        assert!(Scanner::new(config, store, Arc::new(NullNotifier)).is_err());
    }

    #[test]
    fn test_stats_match_summary_after_scan() {
        let (_dir, root) = setup_root();
        let scanner = scanner_with(&root, Arc::new(NullNotifier));

        let report = scanner.scan(&CancellationToken::new()).unwrap();
        assert_eq!(scanner.stats(), report.summary);
    }
}
