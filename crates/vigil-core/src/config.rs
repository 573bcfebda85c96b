//! Configuration structures for the vigil file integrity monitor.
//!
//! This module provides configuration types for all components of the application:
//!
//! - [`ScanConfig`] - Scanner settings (monitored root, recursion, skip list)
//! - [`StoreConfig`] - State store settings (database location)
//! - [`ScheduleConfig`] - Scheduler settings (cadence, deadline, overlap policy)
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`] with sensible values for a
//! single monitored directory, and every field has a serde default so partial
//! configuration files deserialize cleanly.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Policy applied when a scan trigger arrives while a scan is in flight.
///
/// Only one scan may run against a given root/store pair at a time. This
/// policy decides what happens to the second trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum OverlapPolicy {
    /// The overlapping trigger is satisfied by the in-flight scan's result.
    ///
    /// Both callers receive the same completed summary; no duplicate disk
    /// I/O is performed.
    #[default]
    Coalesce,
    /// The overlapping trigger is rejected immediately with a
    /// scan-in-progress error.
    Reject,
}

/// Configuration for the scanner.
///
/// Controls which directory is monitored and how it is traversed.
///
/// # Examples
///
/// ```
/// use vigil_core::ScanConfig;
///
/// let config = ScanConfig::default();
/// assert!(!config.recursive);
/// assert!(!config.follow_links);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Root directory to monitor.
    pub root_path: Utf8PathBuf,

    /// Whether to descend into subdirectories.
    ///
    /// Defaults to `false` (only direct children of the root are scanned).
    /// Recursive mode is the recommended setting for real deployments.
    pub recursive: bool,

    /// Whether to follow symbolic links during traversal.
    pub follow_links: bool,

    /// Directory names to skip during traversal.
    pub skip_dirs: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root_path: Utf8PathBuf::new(),
            recursive: false,
            follow_links: false,
            skip_dirs: vec![".git".to_owned()],
        }
    }
}

impl ScanConfig {
    /// Validates that the configured root exists and is a directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDirectory`] if the root does not exist,
    /// or [`ConfigError::InvalidPath`] if it exists but is not a directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.root_path.exists() {
            return Err(ConfigError::MissingDirectory(self.root_path.clone()));
        }
        if !self.root_path.is_dir() {
            return Err(ConfigError::InvalidPath {
                path: self.root_path.clone(),
                reason: "not a directory".to_owned(),
            });
        }
        Ok(())
    }
}

/// Configuration for the persisted state store.
///
/// # Examples
///
/// ```
/// use vigil_core::StoreConfig;
///
/// let config = StoreConfig::default();
/// assert_eq!(config.db_path, "vigil.db");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database file holding the baseline.
    pub db_path: Utf8PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: Utf8PathBuf::from("vigil.db"),
        }
    }
}

/// Configuration for the scan scheduler.
///
/// Controls the periodic cadence, the per-scan deadline, and how
/// overlapping triggers are arbitrated.
///
/// # Examples
///
/// ```
/// use vigil_core::{OverlapPolicy, ScheduleConfig};
///
/// let config = ScheduleConfig::default();
/// assert_eq!(config.interval_secs, 30);
/// assert_eq!(config.overlap, OverlapPolicy::Coalesce);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds between scheduled scan cycles.
    pub interval_secs: u64,

    /// Deadline in seconds after which an in-flight scan is abandoned.
    ///
    /// Files already processed keep their store updates.
    pub timeout_secs: u64,

    /// Policy for triggers that arrive while a scan is in flight.
    pub overlap: OverlapPolicy,

    /// Capacity of the change notification channel.
    ///
    /// When the delivery collaborator falls this far behind, further
    /// notifications are dropped rather than stalling the scan loop.
    pub notify_buffer: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            timeout_secs: 300,
            overlap: OverlapPolicy::Coalesce,
            notify_buffer: 100,
        }
    }
}

impl ScheduleConfig {
    /// Returns the scan interval as a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Returns the per-scan deadline as a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validates schedule option values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] if `interval_secs` or
    /// `timeout_secs` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidOption {
                option: "interval_secs".to_owned(),
                reason: "must be positive".to_owned(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidOption {
                option: "timeout_secs".to_owned(),
                reason: "must be positive".to_owned(),
            });
        }
        Ok(())
    }
}

/// Root configuration for the vigil monitor.
///
/// Combines all component configurations into a single structure that can be
/// loaded from a configuration file or constructed programmatically.
///
/// # Examples
///
/// ```
/// use vigil_core::Config;
///
/// // Create with defaults
/// let config = Config::default();
///
/// // Serialize to JSON
/// let json = serde_json::to_string_pretty(&config).unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scanner configuration.
    pub scan: ScanConfig,

    /// State store configuration.
    pub store: StoreConfig,

    /// Scheduler configuration.
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Loads configuration from a JSON file.
    ///
    /// Missing fields take their documented defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not valid JSON.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_std_path())?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Validates the whole configuration.
    ///
    /// # Errors
    ///
    /// Propagates the first failing component validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scan.validate()?;
        self.schedule.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_scan_config_defaults() {
        let config = ScanConfig::default();
        assert!(!config.recursive);
        assert!(!config.follow_links);
        assert_eq!(config.skip_dirs, vec![".git"]);
    }

    #[test]
    fn test_schedule_config_defaults() {
        let config = ScheduleConfig::default();
        assert_eq!(config.interval_secs, 30);
        assert_eq!(config.timeout_secs, 300);
        assert_eq!(config.overlap, OverlapPolicy::Coalesce);
        assert_eq!(config.notify_buffer, 100);
    }

    #[test]
    fn test_schedule_config_durations() {
        let config = ScheduleConfig::default();
        assert_eq!(config.interval(), Duration::from_secs(30));
        assert_eq!(config.timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_schedule_config_rejects_zero_interval() {
        let config = ScheduleConfig {
            interval_secs: 0,
            ..ScheduleConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let json = r#"{"scan": {"recursive": true}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.scan.recursive);
        // Other fields should have defaults
        assert_eq!(config.schedule.interval_secs, 30);
        assert_eq!(config.store.db_path, "vigil.db");
    }

    #[test]
    fn test_overlap_policy_serialization() {
        assert_eq!(
            serde_json::to_string(&OverlapPolicy::Coalesce).unwrap(),
            r#""coalesce""#
        );
        assert_eq!(
            serde_json::to_string(&OverlapPolicy::Reject).unwrap(),
            r#""reject""#
        );
    }

    #[test]
    fn test_scan_config_validate_missing_root() {
        let config = ScanConfig {
            root_path: Utf8PathBuf::from("/nonexistent/path/that/does/not/exist"),
            ..ScanConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingDirectory(_))
        ));
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vigil.json");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"schedule": {{"interval_secs": 5}}}}"#).unwrap();

        let utf8 = Utf8PathBuf::from_path_buf(path).unwrap();
        let config = Config::load(&utf8).unwrap();
        assert_eq!(config.schedule.interval_secs, 5);
        assert_eq!(config.schedule.timeout_secs, 300);
    }
}
