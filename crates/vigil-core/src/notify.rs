//! The change notification seam.
//!
//! The diff engine decides *that* a file changed and *what* the old and new
//! digests are; actual delivery (email, webhook, queue) is an external
//! collaborator implementing [`ChangeNotifier`]. The core never waits for
//! delivery confirmation and never retries on the notifier's behalf.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::types::Digest;

/// A detected modification to one monitored file.
///
/// Carries everything a delivery collaborator needs: the path plus the
/// digest pair that proves the change.
///
/// # Examples
///
/// ```
/// use vigil_core::{Digest, FileChange};
/// use camino::Utf8PathBuf;
///
/// let change = FileChange {
///     path: Utf8PathBuf::from("/watched/a.txt"),
///     old_digest: Digest::from_bytes([1u8; 32]),
///     new_digest: Digest::from_bytes([2u8; 32]),
/// };
/// assert_ne!(change.old_digest, change.new_digest);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path of the modified file.
    pub path: Utf8PathBuf,
    /// Digest stored before this scan cycle.
    pub old_digest: Digest,
    /// Digest computed by this scan cycle.
    pub new_digest: Digest,
}

/// Sink for change events, implemented by the delivery collaborator.
///
/// Called once per `Changed` classification, in detection order. The call
/// must not block the scan loop: implementations hand the event off (a
/// channel send, a task spawn) and return immediately. Delivery order,
/// retries, and backoff are the implementor's concern.
pub trait ChangeNotifier: Send + Sync {
    /// Accepts one detected change, fire-and-forget.
    fn file_changed(&self, change: FileChange);
}

/// A notifier that discards every change event.
///
/// Useful in tests and for runs where notification is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl ChangeNotifier for NullNotifier {
    fn file_changed(&self, _change: FileChange) {}
}
