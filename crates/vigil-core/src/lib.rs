//! Core types, errors, and configuration for the vigil file integrity monitor.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - Error types for consistent error handling
//! - Configuration structures for the scanner, store, and scheduler
//! - Domain types ([`Digest`], [`FileRecord`], [`Classification`], [`ScanSummary`])
//! - The [`ChangeNotifier`] seam through which change events leave the core

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod notify;
pub mod types;

pub use config::{Config, OverlapPolicy, ScanConfig, ScheduleConfig, StoreConfig};
pub use error::ConfigError;
pub use notify::{ChangeNotifier, FileChange, NullNotifier};
pub use types::{Classification, Digest, DigestParseError, FileRecord, ScanSummary};
