//! The scan runner: periodic cycles, manual triggers, one gate.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vigil_core::{OverlapPolicy, ScanSummary, ScheduleConfig};
use vigil_scanner::{ScanReport, Scanner};

use crate::error::RunnerError;

/// Shared outcome of one scan cycle.
///
/// Both halves are cheap to clone so every coalesced caller receives the
/// same result.
type CycleResult = Result<Arc<ScanReport>, RunnerError>;

/// Observable state of the runner.
///
/// The runner moves `Idle -> Scanning -> Idle` for every cycle, scheduled
/// or manual. There is no terminal state while the process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// No scan is in flight.
    Idle,
    /// Exactly one scan is in flight.
    Scanning,
}

/// Internal state shared between the schedule loop and manual triggers.
struct Shared {
    /// The diff engine; cheap to clone into the blocking scan task.
    scanner: Scanner,
    /// Cadence, deadline, and overlap policy.
    schedule: ScheduleConfig,
    /// The gate: `Some` while a cycle is in flight, holding the channel
    /// its result will be published on.
    in_flight: Mutex<Option<watch::Receiver<Option<CycleResult>>>>,
    /// Observable Idle/Scanning state.
    state_tx: watch::Sender<RunnerState>,
}

/// Drives periodic scan cycles and arbitrates on-demand triggers.
///
/// # Concurrency Model
///
/// One runner owns one root/store pair. At most one scan is in flight at a
/// time; the schedule loop and manual [`trigger`](ScanRunner::trigger)
/// calls go through the same gate. A trigger arriving mid-scan is either
/// coalesced onto the in-flight cycle (default) or rejected, per
/// [`OverlapPolicy`].
///
/// # Lifecycle
///
/// 1. **Creation**: [`ScanRunner::new`] spawns the schedule loop; the
///    first cycle fires immediately, establishing the baseline.
/// 2. **Triggers**: [`trigger()`](ScanRunner::trigger) runs or joins a
///    cycle and returns its report.
/// 3. **Shutdown**: [`shutdown()`](ScanRunner::shutdown) stops the
///    schedule, waits for any in-flight scan to reach idle, then returns.
///    Dropping the runner signals shutdown without waiting.
pub struct ScanRunner {
    /// State shared with the schedule loop.
    shared: Arc<Shared>,
    /// Handle to the schedule loop task.
    schedule_task: Option<JoinHandle<()>>,
    /// Cancels the schedule loop (not an in-flight scan).
    shutdown: CancellationToken,
}

impl std::fmt::Debug for ScanRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanRunner")
            .field("state", &self.state())
            .field("schedule", &self.shared.schedule)
            .finish_non_exhaustive()
    }
}

impl ScanRunner {
    /// Creates a runner and starts the schedule loop.
    ///
    /// The first scheduled cycle fires immediately, so the baseline is
    /// established at startup rather than one interval later.
    #[must_use]
    pub fn new(scanner: Scanner, schedule: ScheduleConfig) -> Self {
        let (state_tx, _) = watch::channel(RunnerState::Idle);
        let shared = Arc::new(Shared {
            scanner,
            schedule,
            in_flight: Mutex::new(None),
            state_tx,
        });

        let shutdown = CancellationToken::new();
        let schedule_task = tokio::spawn(run_schedule_loop(
            Arc::clone(&shared),
            shutdown.clone(),
        ));

        Self {
            shared,
            schedule_task: Some(schedule_task),
            shutdown,
        }
    }

    /// Triggers a scan cycle on demand.
    ///
    /// This is the scan-trigger interface exposed to external callers
    /// (an HTTP layer, a CLI). If no scan is in flight, one starts; if one
    /// is, the overlap policy decides:
    ///
    /// - [`OverlapPolicy::Coalesce`]: this call waits for the in-flight
    ///   cycle and returns its report, avoiding duplicate disk I/O.
    /// - [`OverlapPolicy::Reject`]: this call fails immediately with
    ///   [`RunnerError::ScanInProgress`].
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::ScanInProgress`], [`RunnerError::Timeout`],
    /// or the cycle's own failure.
    pub async fn trigger(&self) -> Result<Arc<ScanReport>, RunnerError> {
        run_or_join(&self.shared).await
    }

    /// Returns the runner's current state.
    #[must_use]
    pub fn state(&self) -> RunnerState {
        *self.shared.state_tx.borrow()
    }

    /// Subscribes to state transitions.
    ///
    /// Useful for reporting collaborators that want to display scan
    /// activity without polling.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<RunnerState> {
        self.shared.state_tx.subscribe()
    }

    /// Returns a snapshot of the current cycle's statistics.
    ///
    /// Safe to call while a scan is in flight.
    #[must_use]
    pub fn stats(&self) -> ScanSummary {
        self.shared.scanner.stats()
    }

    /// Gracefully shuts the runner down.
    ///
    /// Stops the schedule loop, waits for any in-flight scan (scheduled or
    /// manual) to reach idle, then returns. No scan is interrupted: the
    /// drain waits rather than cancels.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::TaskFailed`] if the schedule loop panicked.
    pub async fn shutdown(mut self) -> Result<(), RunnerError> {
        info!("Shutting down scan runner");
        self.shutdown.cancel();

        // The loop finishes its current cycle before observing the signal
        if let Some(task) = self.schedule_task.take() {
            if task.await.is_err() {
                return Err(RunnerError::TaskFailed);
            }
        }

        // Drain a manual trigger still in flight
        let in_flight = self.shared.in_flight.lock().await.clone();
        if let Some(mut rx) = in_flight {
            while rx.borrow_and_update().is_none() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }

        info!("Scan runner idle, shutdown complete");
        Ok(())
    }
}

impl Drop for ScanRunner {
    fn drop(&mut self) {
        // Signal the schedule loop; Drop is sync, so no drain here
        self.shutdown.cancel();
    }
}

/// Runs scheduled cycles until shutdown is signalled.
async fn run_schedule_loop(shared: Arc<Shared>, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval(shared.schedule.interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        interval_secs = shared.schedule.interval_secs,
        "Starting scheduled scans"
    );

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        // Run the cycle to completion even if shutdown arrives meanwhile;
        // graceful drain depends on never abandoning a cycle mid-flight
        match run_or_join(&shared).await {
            Ok(report) => {
                info!(
                    new = report.summary.new,
                    changed = report.summary.changed,
                    unchanged = report.summary.unchanged,
                    errors = report.summary.errors,
                    "Scheduled scan completed"
                );
            }
            Err(RunnerError::ScanInProgress) => {
                debug!("Scheduled tick skipped, scan already in progress");
            }
            Err(e) => {
                warn!(error = %e, "Scheduled scan failed, will retry next tick");
            }
        }

        if shutdown.is_cancelled() {
            break;
        }
    }

    info!("Scheduled scans stopped");
}

/// The role a caller takes at the gate.
enum Role {
    /// This caller starts the cycle and publishes its result.
    Leader(watch::Sender<Option<CycleResult>>),
    /// This caller waits on the in-flight cycle's result.
    Follower(watch::Receiver<Option<CycleResult>>),
}

/// Starts a cycle, or joins the in-flight one per the overlap policy.
async fn run_or_join(shared: &Arc<Shared>) -> Result<Arc<ScanReport>, RunnerError> {
    // Decide leader vs follower while holding the gate
    let role = {
        let mut in_flight = shared.in_flight.lock().await;
        if let Some(rx) = in_flight.as_ref() {
            if matches!(shared.schedule.overlap, OverlapPolicy::Reject) {
                return Err(RunnerError::ScanInProgress);
            }
            Role::Follower(rx.clone())
        } else {
            let (tx, rx) = watch::channel(None);
            *in_flight = Some(rx);
            Role::Leader(tx)
        }
    };

    let publish = match role {
        Role::Follower(rx) => {
            debug!("Coalescing trigger onto in-flight scan");
            return join_cycle(rx).await;
        }
        Role::Leader(tx) => tx,
    };

    // Leader: run the cycle, clear the gate, publish to followers
    let _ = shared.state_tx.send(RunnerState::Scanning);
    let result = execute_scan(shared).await;
    let _ = shared.state_tx.send(RunnerState::Idle);

    *shared.in_flight.lock().await = None;
    let _ = publish.send(Some(result.clone()));

    result
}

/// Waits for the in-flight cycle's published result.
async fn join_cycle(
    mut rx: watch::Receiver<Option<CycleResult>>,
) -> Result<Arc<ScanReport>, RunnerError> {
    loop {
        if let Some(result) = rx.borrow_and_update().clone() {
            return result;
        }
        if rx.changed().await.is_err() {
            return Err(RunnerError::TaskFailed);
        }
    }
}

/// Executes one scan on the blocking pool, bounded by the deadline.
async fn execute_scan(shared: &Arc<Shared>) -> CycleResult {
    let cancel = CancellationToken::new();
    let scan_cancel = cancel.clone();
    let scanner = shared.scanner.clone();

    let mut handle = tokio::task::spawn_blocking(move || scanner.scan(&scan_cancel));

    tokio::select! {
        joined = &mut handle => match joined {
            Ok(Ok(report)) => Ok(Arc::new(report)),
            Ok(Err(e)) => Err(RunnerError::from(e)),
            Err(_) => Err(RunnerError::TaskFailed),
        },
        () = tokio::time::sleep(shared.schedule.timeout()) => {
            warn!(
                timeout_secs = shared.schedule.timeout_secs,
                "Scan exceeded deadline, abandoning"
            );
            cancel.cancel();
            // Wait for the scan to reach its next between-files check so
            // the gate stays honest; processed files keep their updates
            let _ = handle.await;
            Err(RunnerError::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::mpsc as std_mpsc;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use camino::Utf8PathBuf;
    use vigil_core::{ChangeNotifier, FileChange, NullNotifier, ScanConfig};
    use vigil_store::StateStore;

    /// Blocks inside the scan loop until the test releases it, so tests
    /// can hold a scan in flight deterministically.
    struct BlockingNotifier {
        entered_tx: std_mpsc::Sender<()>,
        release_rx: StdMutex<std_mpsc::Receiver<()>>,
        calls: std::sync::atomic::AtomicU64,
    }

    impl BlockingNotifier {
        fn new() -> (Arc<Self>, std_mpsc::Receiver<()>, std_mpsc::Sender<()>) {
            let (entered_tx, entered_rx) = std_mpsc::channel();
            let (release_tx, release_rx) = std_mpsc::channel();
            let notifier = Arc::new(Self {
                entered_tx,
                release_rx: StdMutex::new(release_rx),
                calls: std::sync::atomic::AtomicU64::new(0),
            });
            (notifier, entered_rx, release_tx)
        }

        fn calls(&self) -> u64 {
            self.calls.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    impl ChangeNotifier for BlockingNotifier {
        fn file_changed(&self, _change: FileChange) {
            self.calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let _ = self.entered_tx.send(());
            let _ = self.release_rx.lock().unwrap().recv();
        }
    }

    fn setup_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        fs::write(root.join("a.txt"), "hello").unwrap();
        (dir, root)
    }

    fn make_scanner(root: &Utf8PathBuf, notifier: Arc<dyn ChangeNotifier>) -> Scanner {
        let config = ScanConfig {
            root_path: root.clone(),
            ..ScanConfig::default()
        };
        let store = Arc::new(StateStore::open_in_memory().unwrap());
        Scanner::new(config, store, notifier).unwrap()
    }

    /// Schedule config with an interval long enough that only the
    /// immediate startup cycle fires during a test.
    fn quiet_schedule() -> ScheduleConfig {
        ScheduleConfig {
            interval_secs: 3600,
            timeout_secs: 300,
            ..ScheduleConfig::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_startup_cycle_establishes_baseline() {
        let (_dir, root) = setup_root();
        let scanner = make_scanner(&root, Arc::new(NullNotifier));
        let runner = ScanRunner::new(scanner, quiet_schedule());

        // Coalesces with the startup cycle or runs right after it
        let report = runner.trigger().await.unwrap();
        assert_eq!(report.summary.total, 1);

        runner.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_back_to_back_triggers_coalesce() {
        let (_dir, root) = setup_root();
        let (notifier, entered_rx, release_tx) = BlockingNotifier::new();
        let scanner = make_scanner(&root, Arc::clone(&notifier) as Arc<dyn ChangeNotifier>);
        let runner = Arc::new(ScanRunner::new(scanner, quiet_schedule()));

        // Baseline, then a modification so the next scan blocks in the notifier
        runner.trigger().await.unwrap();
        // Let the immediate startup tick finish as well, so the blocking
        // scan below is the only cycle in flight
        tokio::time::sleep(Duration::from_millis(200)).await;
        fs::write(root.join("a.txt"), "tampered").unwrap();

        let r1 = Arc::clone(&runner);
        let t1 = tokio::spawn(async move { r1.trigger().await });

        // Wait until the scan is provably mid-flight
        tokio::task::spawn_blocking(move || entered_rx.recv().unwrap())
            .await
            .unwrap();
        assert_eq!(runner.state(), RunnerState::Scanning);

        let r2 = Arc::clone(&runner);
        let t2 = tokio::spawn(async move { r2.trigger().await });

        // The second trigger registers as a follower while the leader is
        // still blocked; it must not start a second scan
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(notifier.calls(), 1);

        release_tx.send(()).unwrap();

        let first = t1.await.unwrap().unwrap();
        let second = t2.await.unwrap().unwrap();

        // One scan, one report, two satisfied callers
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.summary.changed, 1);
        assert_eq!(runner.state(), RunnerState::Idle);

        drop(release_tx);
        let runner = Arc::try_unwrap(runner).unwrap();
        runner.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reject_policy_refuses_overlap() {
        let (_dir, root) = setup_root();
        let (notifier, entered_rx, release_tx) = BlockingNotifier::new();
        let scanner = make_scanner(&root, Arc::clone(&notifier) as Arc<dyn ChangeNotifier>);
        let store = Arc::clone(scanner.store());
        let schedule = ScheduleConfig {
            overlap: OverlapPolicy::Reject,
            ..quiet_schedule()
        };
        let runner = Arc::new(ScanRunner::new(scanner, schedule));

        // Under reject a manual baseline trigger could collide with the
        // startup cycle, so wait for the baseline through the store instead
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while store.len().unwrap() == 0 {
            assert!(
                tokio::time::Instant::now() < deadline,
                "baseline never appeared"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        fs::write(root.join("a.txt"), "tampered").unwrap();

        let r1 = Arc::clone(&runner);
        let t1 = tokio::spawn(async move { r1.trigger().await });

        tokio::task::spawn_blocking(move || entered_rx.recv().unwrap())
            .await
            .unwrap();

        let err = runner.trigger().await.unwrap_err();
        assert!(matches!(err, RunnerError::ScanInProgress));

        release_tx.send(()).unwrap();
        t1.await.unwrap().unwrap();

        drop(release_tx);
        let runner = Arc::try_unwrap(runner).unwrap();
        runner.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_deadline_abandons_scan() {
        let (_dir, root) = setup_root();
        let (notifier, entered_rx, release_tx) = BlockingNotifier::new();
        let scanner = make_scanner(&root, Arc::clone(&notifier) as Arc<dyn ChangeNotifier>);
        let schedule = ScheduleConfig {
            timeout_secs: 1,
            ..quiet_schedule()
        };
        let runner = Arc::new(ScanRunner::new(scanner, schedule));

        runner.trigger().await.unwrap();
        // Let the immediate startup tick finish as well, so the blocking
        // scan below is the only cycle in flight
        tokio::time::sleep(Duration::from_millis(200)).await;
        fs::write(root.join("a.txt"), "tampered").unwrap();

        let r1 = Arc::clone(&runner);
        let t1 = tokio::spawn(async move { r1.trigger().await });

        tokio::task::spawn_blocking(move || entered_rx.recv().unwrap())
            .await
            .unwrap();

        // Hold past the one-second deadline, then let the scan finish its
        // current file so the runner can observe the abandonment
        tokio::time::sleep(Duration::from_millis(1300)).await;
        release_tx.send(()).unwrap();

        let err = t1.await.unwrap().unwrap_err();
        assert!(matches!(err, RunnerError::Timeout));
        assert_eq!(runner.state(), RunnerState::Idle);

        drop(release_tx);
        let runner = Arc::try_unwrap(runner).unwrap();
        runner.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_periodic_cycles_fire() {
        let (_dir, root) = setup_root();
        let scanner = make_scanner(&root, Arc::new(NullNotifier));
        let store = Arc::clone(scanner.store());
        let schedule = ScheduleConfig {
            interval_secs: 1,
            ..ScheduleConfig::default()
        };
        let runner = ScanRunner::new(scanner, schedule);

        // The startup cycle lands the baseline without any manual trigger
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            if store.len().unwrap() == 1 {
                break;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "baseline never appeared"
            );
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        runner.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shutdown_drains_to_idle() {
        let (_dir, root) = setup_root();
        let scanner = make_scanner(&root, Arc::new(NullNotifier));
        let runner = ScanRunner::new(scanner, quiet_schedule());

        runner.trigger().await.unwrap();
        runner.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_state_transitions_observed() {
        let (_dir, root) = setup_root();
        let scanner = make_scanner(&root, Arc::new(NullNotifier));
        let runner = ScanRunner::new(scanner, quiet_schedule());

        let mut states = runner.watch_state();
        runner.trigger().await.unwrap();

        // After a completed trigger the runner is idle again
        assert_eq!(*states.borrow_and_update(), RunnerState::Idle);
        runner.shutdown().await.unwrap();
    }
}
