//! Scan scheduling and trigger arbitration for the vigil file integrity
//! monitor.
//!
//! This crate drives periodic scan cycles and arbitrates manual on-demand
//! triggers against them. A single gate guarantees at most one scan per
//! runner is in flight; overlapping triggers either coalesce onto the
//! in-flight cycle or are rejected, per configuration.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                     Async Runtime (tokio)                      │
//! │  ┌────────────────┐   trigger()   ┌─────────────────────────┐  │
//! │  │ schedule loop  │ ─────────────▶│ scan gate               │  │
//! │  │ (interval tick)│               │ (leader or coalesce)    │  │
//! │  └────────────────┘               └───────────┬─────────────┘  │
//! │  ┌────────────────┐                           │ spawn_blocking │
//! │  │ manual callers │ ── trigger() ─────────────┤                │
//! │  └────────────────┘                           ▼                │
//! └───────────────────────────────────┌─────────────────────────┐──┘
//!                                     │ Scanner::scan           │
//!                                     │ (blocking thread,       │
//!                                     │  cancellable per file)  │
//!                                     └─────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use vigil_runner::ScanRunner;
//!
//! let runner = ScanRunner::new(scanner, config.schedule);
//!
//! // External callers (an HTTP layer, a CLI) trigger on demand:
//! let report = runner.trigger().await?;
//! println!("{} changed", report.summary.changed);
//!
//! // Graceful drain: stops the schedule, waits for in-flight work.
//! runner.shutdown().await?;
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod runner;

pub use error::RunnerError;
pub use runner::{RunnerState, ScanRunner};
