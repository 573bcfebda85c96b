//! Non-blocking change notification handoff.
//!
//! The original design flaw this module exists to avoid: running delivery
//! inline in the per-file scan loop, so one slow notification stalls the
//! whole cycle. [`ChannelNotifier`] instead hands each change to a bounded
//! channel consumed by the external delivery worker; the scan loop never
//! waits on it.
//!
//! # Event Flow
//!
//! ```text
//! Diff Engine (Changed classification)
//!        │
//!        │ try_send (never blocks)
//!        ▼
//! bounded mpsc channel
//!        │
//!        ▼
//! delivery worker (external collaborator: email, webhook, ...)
//! ```

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use vigil_core::{ChangeNotifier, FileChange};

/// A notifier that hands change events to a bounded channel.
///
/// The send never blocks: when the delivery collaborator falls a full
/// buffer behind, further events are dropped with a warning rather than
/// stalling the scan loop. Events are sent in detection order; delivery
/// order and retries are the consumer's concern.
///
/// # Examples
///
/// ```
/// use vigil_scanner::ChannelNotifier;
/// use vigil_core::{ChangeNotifier, Digest, FileChange};
/// use camino::Utf8PathBuf;
///
/// let (notifier, mut rx) = ChannelNotifier::new(16);
///
/// notifier.file_changed(FileChange {
///     path: Utf8PathBuf::from("/watched/a.txt"),
///     old_digest: Digest::from_bytes([1u8; 32]),
///     new_digest: Digest::from_bytes([2u8; 32]),
/// });
///
/// let change = rx.try_recv().unwrap();
/// assert_eq!(change.path, "/watched/a.txt");
/// ```
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    /// Sender half of the handoff channel.
    tx: mpsc::Sender<FileChange>,
}

impl ChannelNotifier {
    /// Creates a notifier and the receiver for the delivery worker.
    ///
    /// # Arguments
    ///
    /// * `capacity` - How many undelivered events to buffer before dropping
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<FileChange>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl ChangeNotifier for ChannelNotifier {
    fn file_changed(&self, change: FileChange) {
        match self.tx.try_send(change) {
            Ok(()) => {}
            Err(TrySendError::Full(change)) => {
                warn!(
                    path = %change.path,
                    "Notification buffer full, dropping change event"
                );
            }
            Err(TrySendError::Closed(change)) => {
                debug!(
                    path = %change.path,
                    "Notification receiver gone, dropping change event"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use vigil_core::Digest;

    fn change(name: &str) -> FileChange {
        FileChange {
            path: Utf8PathBuf::from(name),
            old_digest: Digest::from_bytes([1u8; 32]),
            new_digest: Digest::from_bytes([2u8; 32]),
        }
    }

    #[test]
    fn test_events_arrive_in_detection_order() {
        let (notifier, mut rx) = ChannelNotifier::new(8);
        notifier.file_changed(change("/w/a.txt"));
        notifier.file_changed(change("/w/b.txt"));

        assert_eq!(rx.try_recv().unwrap().path, "/w/a.txt");
        assert_eq!(rx.try_recv().unwrap().path, "/w/b.txt");
    }

    #[test]
    fn test_full_buffer_drops_without_blocking() {
        let (notifier, mut rx) = ChannelNotifier::new(1);
        notifier.file_changed(change("/w/a.txt"));
        // Buffer is full; this must return immediately instead of blocking
        notifier.file_changed(change("/w/b.txt"));

        assert_eq!(rx.try_recv().unwrap().path, "/w/a.txt");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_receiver_is_tolerated() {
        let (notifier, rx) = ChannelNotifier::new(1);
        drop(rx);
        notifier.file_changed(change("/w/a.txt"));
    }
}
