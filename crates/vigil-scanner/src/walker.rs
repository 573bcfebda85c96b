//! Directory traversal for monitored files.
//!
//! This module provides [`FileWalker`], which uses the `ignore` crate to
//! enumerate the regular files under a monitored root.
//!
//! # Features
//!
//! - One-level or recursive traversal (one-level is the default)
//! - Skips directories, symlinks-to-directories, and non-regular files
//! - Configurable skip-directory list and symlink following
//! - Produces a sorted path list, so ordering is deterministic
//! - Per-entry failures are collected, not fatal
//!
//! Hidden files are included: an integrity monitor that cannot see dotfiles
//! would miss exactly the files attackers like to touch.

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;

use crate::error::ScanError;

/// The outcome of one directory enumeration.
///
/// Per-entry failures do not abort the walk; they land in `errors` while
/// the remaining siblings are still enumerated.
#[derive(Debug, Default)]
pub struct Walked {
    /// Absolute paths of every regular file found, sorted.
    pub paths: Vec<Utf8PathBuf>,
    /// Entries that could not be enumerated or decoded.
    pub errors: Vec<ScanError>,
}

/// A file walker that discovers regular files under a monitored root.
///
/// # Design
///
/// The walker uses a "collect-then-process" pattern: all paths are gathered
/// up front, sorted for a stable ordering, then handed to the diff engine.
/// A stable ordering keeps scan cycles deterministic and notifications
/// reproducible given the same filesystem state.
///
/// # Examples
///
/// ```ignore
/// use vigil_scanner::FileWalker;
/// use camino::Utf8Path;
///
/// let walker = FileWalker::new(Utf8Path::new("/watched"))?.with_recursive(true);
/// let walked = walker.collect_paths()?;
///
/// println!("Found {} files, {} errors", walked.paths.len(), walked.errors.len());
/// ```
#[derive(Debug)]
pub struct FileWalker {
    /// The root directory to walk.
    root: Utf8PathBuf,
    /// Whether to descend into subdirectories.
    recursive: bool,
    /// Whether to follow symbolic links.
    follow_links: bool,
    /// Directory names to skip.
    skip_dirs: Vec<String>,
}

impl FileWalker {
    /// Creates a new file walker for the given root directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the root doesn't exist or isn't a
    /// directory, and [`ScanError::Read`] if it exists but cannot be opened
    /// for enumeration. A bad root is reported, never silently swallowed.
    pub fn new(root: &Utf8Path) -> Result<Self, ScanError> {
        if !root.exists() {
            return Err(ScanError::config(format!(
                "root path does not exist: {root}"
            )));
        }
        if !root.is_dir() {
            return Err(ScanError::config(format!(
                "root path is not a directory: {root}"
            )));
        }
        // Surface an unreadable root here rather than as a mid-walk error
        std::fs::read_dir(root.as_std_path()).map_err(|e| ScanError::read(root, e))?;

        Ok(Self {
            root: root.to_owned(),
            recursive: false,
            follow_links: false,
            skip_dirs: Vec::new(),
        })
    }

    /// Configures whether to descend into subdirectories.
    ///
    /// Defaults to `false`: only direct children of the root are scanned.
    #[must_use]
    pub const fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Configures whether to follow symbolic links.
    ///
    /// By default, symbolic links are not followed.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Adds directories to skip during traversal.
    ///
    /// # Arguments
    ///
    /// * `dirs` - Directory names to skip (not full paths)
    #[must_use]
    pub fn with_skip_dirs(mut self, dirs: &[&str]) -> Self {
        self.skip_dirs.extend(dirs.iter().map(ToString::to_string));
        self
    }

    /// Enumerates the regular files under the root.
    ///
    /// Returns the sorted path list plus any per-entry errors. An
    /// unreadable entry never aborts enumeration of its siblings;
    /// root-level problems are caught earlier, by [`FileWalker::new`].
    #[must_use]
    pub fn collect_paths(&self) -> Walked {
        let mut walked = Walked::default();

        for result in self.build_walker() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    walked.errors.push(ScanError::Walk(e));
                    continue;
                }
            };

            // Skip directories, symlinks-to-directories, and non-regular files
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let Some(utf8_path) = Utf8Path::from_path(path) else {
                walked
                    .errors
                    .push(ScanError::NonUtf8Path(path.to_owned()));
                continue;
            };

            if self.should_skip_path(utf8_path) {
                continue;
            }

            walked.paths.push(utf8_path.to_owned());
        }

        walked.paths.sort();
        walked
    }

    /// Builds the ignore walker with configured settings.
    fn build_walker(&self) -> ignore::Walk {
        WalkBuilder::new(&self.root)
            // No gitignore/hidden filtering: integrity monitoring must see
            // every regular file under the root
            .standard_filters(false)
            .follow_links(self.follow_links)
            .threads(1)
            .require_git(false)
            .max_depth(if self.recursive { None } else { Some(1) })
            .build()
    }

    /// Checks if a path should be skipped based on directory name.
    fn should_skip_path(&self, path: &Utf8Path) -> bool {
        path.components()
            .any(|component| self.skip_dirs.iter().any(|d| d == component.as_str()))
    }

    /// Returns the root directory being walked.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}
