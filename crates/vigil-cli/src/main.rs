//! CLI entry point for the vigil file integrity monitor.
//!
//! This binary monitors a directory tree for unexpected content changes by
//! fingerprinting files and diffing against a persisted baseline.
//!
//! # Usage
//!
//! ```bash
//! vigil [OPTIONS] <COMMAND>
//!
//! # One scan cycle against the baseline, with a summary
//! vigil scan --root /etc --db /var/lib/vigil/etc.db
//!
//! # Continuous monitoring on the configured interval
//! vigil monitor --root /etc --recursive --interval 30
//!
//! # Dump the persisted baseline
//! vigil report --format json --output baseline.json
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use vigil_core::{Config, FileRecord, NullNotifier, ScanSummary};
use vigil_runner::ScanRunner;
use vigil_scanner::{ChannelNotifier, ScanReport, Scanner};
use vigil_store::StateStore;

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// File integrity monitor: detects content changes across scan cycles.
///
/// Fingerprints every regular file under the monitored root with SHA-256,
/// persists the digests, and reports files whose content changed since the
/// last scan.
#[derive(Parser)]
#[command(name = "vigil", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Directory to monitor.
    #[arg(short, long, global = true, env = "VIGIL_ROOT")]
    root: Option<Utf8PathBuf>,

    /// Path to the baseline database.
    ///
    /// Defaults to `./vigil.db` if not specified.
    #[arg(long, global = true, env = "VIGIL_DB")]
    db: Option<Utf8PathBuf>,

    /// Path to a JSON configuration file.
    #[arg(short, long, global = true, env = "VIGIL_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Descend into subdirectories (recommended).
    #[arg(long, global = true)]
    recursive: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Run one scan cycle and display the summary.
    Scan {
        /// Show the per-file findings list.
        #[arg(short, long)]
        detailed: bool,
    },

    /// Monitor continuously on a fixed interval until interrupted.
    Monitor {
        /// Seconds between scan cycles (overrides configuration).
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Dump the persisted baseline.
    Report {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Json)]
        format: ReportFormat,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },
}

/// Report output format.
#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    /// JSON format.
    Json,
    /// CSV format.
    Csv,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
///
/// # Arguments
///
/// * `verbose` - Enable debug-level logging
/// * `no_color` - Disable ANSI colors in output
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(level)
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

/// Builds a [`Config`] from the configuration file and CLI overrides.
///
/// # Errors
///
/// Returns an error if no root is configured, the root is unusable, or the
/// configuration file fails to load.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(root) = &cli.root {
        config.scan.root_path.clone_from(root);
    }
    if let Some(db) = &cli.db {
        config.store.db_path.clone_from(db);
    }
    if cli.recursive {
        config.scan.recursive = true;
    }

    if config.scan.root_path.as_str().is_empty() {
        return Err(color_eyre::eyre::eyre!(
            "no directory to monitor; pass --root or set scan.root_path"
        ));
    }

    config.validate()?;
    Ok(config)
}

/// Opens the baseline store and builds a scanner over it.
fn create_scanner(
    config: &Config,
    notifier: Arc<dyn vigil_core::ChangeNotifier>,
) -> color_eyre::Result<(Arc<StateStore>, Scanner)> {
    let store = Arc::new(StateStore::open(&config.store.db_path)?);
    let scanner = Scanner::new(config.scan.clone(), Arc::clone(&store), notifier)?;
    Ok((store, scanner))
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs one scan cycle with summary output.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the scan aborts.
fn run_scan(config: &Config, detailed: bool) -> color_eyre::Result<()> {
    info!(root = %config.scan.root_path, "Starting scan");

    let (store, scanner) = create_scanner(config, Arc::new(NullNotifier))?;
    let report = scanner.scan(&CancellationToken::new())?;

    print_summary(&report.summary);

    if detailed {
        print_findings(&report);
    }

    // Print any errors encountered
    if !report.errors.is_empty() {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        writeln!(handle)?;
        writeln!(handle, "Errors ({}):", report.errors.len())?;
        for error in &report.errors {
            writeln!(handle, "  {error}")?;
        }
    }

    drop(scanner);
    close_store(store);
    Ok(())
}

/// Monitors continuously until SIGINT/SIGTERM.
///
/// Change events land on the notification channel and are echoed by a
/// delivery worker; a real deployment would hand them to email/webhook
/// transport instead.
///
/// # Errors
///
/// Returns an error if setup fails; scan failures inside the loop are
/// logged and retried on the next tick.
async fn run_monitor(mut config: Config, interval: Option<u64>) -> color_eyre::Result<()> {
    if let Some(secs) = interval {
        config.schedule.interval_secs = secs;
        config.schedule.validate()?;
    }

    info!(
        root = %config.scan.root_path,
        interval_secs = config.schedule.interval_secs,
        "Starting monitor"
    );

    let (notifier, mut changes) = ChannelNotifier::new(config.schedule.notify_buffer);
    let (store, scanner) = create_scanner(&config, Arc::new(notifier))?;

    // Stand-in delivery worker: echo each change event. The channel keeps
    // delivery out of the scan loop.
    let delivery = tokio::spawn(async move {
        while let Some(change) = changes.recv().await {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            let _ = writeln!(
                handle,
                "CHANGE {} {} -> {}",
                change.path, change.old_digest, change.new_digest
            );
        }
    });

    let runner = ScanRunner::new(scanner, config.schedule);

    wait_for_shutdown_signal().await?;

    runner.shutdown().await?;
    delivery.await?;
    close_store(store);
    Ok(())
}

/// Waits for SIGINT (and SIGTERM on unix).
async fn wait_for_shutdown_signal() -> color_eyre::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received SIGINT, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received interrupt, shutting down");
    }

    Ok(())
}

/// Dumps the persisted baseline in the specified format.
///
/// Does not scan; this reads whatever the last completed cycles recorded.
///
/// # Errors
///
/// Returns an error if the store cannot be read or the output written.
fn run_report(
    config: &Config,
    format: ReportFormat,
    output: Option<Utf8PathBuf>,
) -> color_eyre::Result<()> {
    info!(db = %config.store.db_path, "Generating report");

    let store = StateStore::open(&config.store.db_path)?;
    let records = store.all_records()?;

    let content = match format {
        ReportFormat::Json => generate_json_report(&records)?,
        ReportFormat::Csv => generate_csv_report(&records),
    };

    if let Some(output_path) = output {
        std::fs::write(output_path.as_std_path(), &content)?;
        info!(path = %output_path, "Report written");
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{content}")?;
    }

    store.close()?;
    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Prints a summary of one scan cycle.
fn print_summary(summary: &ScanSummary) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let _ = writeln!(handle);
    let _ = writeln!(handle, "File Integrity Summary");
    let _ = writeln!(handle, "======================");
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Total files scanned: {}", summary.total);
    let _ = writeln!(
        handle,
        "  New:        {} (baseline established)",
        summary.new
    );
    let _ = writeln!(
        handle,
        "  Changed:    {} (content modified)",
        summary.changed
    );
    let _ = writeln!(handle, "  Unchanged:  {}", summary.unchanged);
    let _ = writeln!(handle, "  Errors:     {}", summary.errors);
}

/// Prints the per-file findings of one scan cycle.
fn print_findings(report: &ScanReport) {
    if report.findings.is_empty() {
        return;
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Findings ({}):", report.findings.len());
    for (path, classification) in &report.findings {
        let _ = writeln!(handle, "  {:9} {path}", classification.label());
    }
}

/// Generates a JSON report of the baseline.
fn generate_json_report(records: &[FileRecord]) -> color_eyre::Result<String> {
    #[derive(serde::Serialize)]
    struct Report<'a> {
        total: usize,
        records: &'a [FileRecord],
    }

    let report = Report {
        total: records.len(),
        records,
    };
    serde_json::to_string_pretty(&report)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to serialize JSON: {}", e))
}

/// Generates a CSV report of the baseline.
fn generate_csv_report(records: &[FileRecord]) -> String {
    use std::fmt::Write;

    let mut output = String::from("path,digest,last_seen_at\n");

    for record in records {
        let escaped_path = escape_csv(record.path.as_str());

        // Use write! to avoid extra allocation from format!
        let _ = writeln!(
            output,
            "{escaped_path},{},{}",
            record.digest, record.last_seen_at
        );
    }

    output
}

/// Escapes a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_owned()
    }
}

/// Closes the store if this was the last handle, surfacing nothing on the
/// happy path.
fn close_store(store: Arc<StateStore>) {
    match Arc::try_unwrap(store) {
        Ok(store) => {
            if let Err(e) = store.close() {
                debug!(error = %e, "Store did not close cleanly");
            }
        }
        Err(_) => debug!("Store handle still shared at shutdown"),
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Route to appropriate command
    match &cli.command {
        Commands::Scan { detailed } => {
            let config = build_config(&cli)?;
            run_scan(&config, *detailed)
        }
        Commands::Monitor { interval } => {
            let config = build_config(&cli)?;
            run_monitor(config, *interval).await
        }
        Commands::Report { format, output } => {
            let config = build_config(&cli)?;
            run_report(&config, *format, output.clone())
        }
    }
}
