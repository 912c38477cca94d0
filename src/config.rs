//! Scheduler settings parsing, range validation, and persistence.
//!
//! [`SchedulerSettings`] is an immutable snapshot: the scheduler never
//! mutates it, and updates arrive only as whole-snapshot replacement.
//! Persistence is the [`SettingsStore`] load/save contract; the
//! scheduler never parses storage formats itself.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppError, Result};

/// Stall watchdog tuning knobs.
///
/// Detection is purely time-based: a long-but-healthy unit of work and
/// a genuine hang are indistinguishable, so the threshold stays a
/// configurable trade-off rather than a heuristic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct WatchdogConfig {
    /// Interval between liveness checks.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    /// Silence duration after which a run counts as stalled.
    #[serde(default = "default_stall_threshold")]
    pub stall_threshold_secs: u64,
    /// Maximum automatic resume attempts per logical run.
    #[serde(default = "default_max_auto_resumes")]
    pub max_auto_resumes: u32,
}

fn default_check_interval() -> u64 {
    3
}

fn default_stall_threshold() -> u64 {
    15
}

fn default_max_auto_resumes() -> u32 {
    3
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval(),
            stall_threshold_secs: default_stall_threshold(),
            max_auto_resumes: default_max_auto_resumes(),
        }
    }
}

impl WatchdogConfig {
    /// Liveness check interval as a [`Duration`].
    #[must_use]
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Stall threshold as a [`Duration`].
    #[must_use]
    pub fn stall_threshold(&self) -> Duration {
        Duration::from_secs(self.stall_threshold_secs)
    }
}

/// Immutable scheduler settings snapshot parsed from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerSettings {
    /// Whether tiers auto-run after idle delays.
    #[serde(default = "default_true")]
    pub auto_run_enabled: bool,
    /// Inactivity delay before the core tier starts (5–120 s).
    #[serde(default = "default_core_idle_delay")]
    pub core_idle_delay_secs: u64,
    /// Inactivity delay before the extended tier starts (30–300 s).
    #[serde(default = "default_extended_idle_delay")]
    pub extended_idle_delay_secs: u64,
    /// Batch size for the extended tier (1–10).
    #[serde(default = "default_batch_size")]
    pub extended_batch_size: u32,
    /// Maximum failure records retained per run.
    #[serde(default = "default_max_tracked_failures")]
    pub max_tracked_failures: u32,
    /// Whether failed runs are reported at warn level.
    #[serde(default = "default_true")]
    pub notify_on_failure: bool,
    /// Stall watchdog tuning.
    #[serde(default)]
    pub watchdog: WatchdogConfig,
}

fn default_true() -> bool {
    true
}

fn default_core_idle_delay() -> u64 {
    30
}

fn default_extended_idle_delay() -> u64 {
    120
}

fn default_batch_size() -> u32 {
    5
}

fn default_max_tracked_failures() -> u32 {
    50
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            auto_run_enabled: default_true(),
            core_idle_delay_secs: default_core_idle_delay(),
            extended_idle_delay_secs: default_extended_idle_delay(),
            extended_batch_size: default_batch_size(),
            max_tracked_failures: default_max_tracked_failures(),
            notify_on_failure: default_true(),
            watchdog: WatchdogConfig::default(),
        }
    }
}

impl SchedulerSettings {
    /// Load and validate settings from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if range validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse settings from a TOML string and enforce value ranges.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let settings: Self = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Enforce the recognized value ranges.
    ///
    /// Callers replacing a settings snapshot are responsible for running
    /// this; the scheduler assumes a pre-validated snapshot.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first out-of-range field.
    pub fn validate(&self) -> Result<()> {
        if !(5..=120).contains(&self.core_idle_delay_secs) {
            return Err(AppError::Config(
                "core_idle_delay_secs must be within 5..=120".into(),
            ));
        }
        if !(30..=300).contains(&self.extended_idle_delay_secs) {
            return Err(AppError::Config(
                "extended_idle_delay_secs must be within 30..=300".into(),
            ));
        }
        if !(1..=10).contains(&self.extended_batch_size) {
            return Err(AppError::Config(
                "extended_batch_size must be within 1..=10".into(),
            ));
        }
        if self.watchdog.check_interval_secs == 0 {
            return Err(AppError::Config(
                "watchdog.check_interval_secs must be greater than zero".into(),
            ));
        }
        if self.watchdog.stall_threshold_secs == 0 {
            return Err(AppError::Config(
                "watchdog.stall_threshold_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Core idle delay as a [`Duration`].
    #[must_use]
    pub fn core_idle_delay(&self) -> Duration {
        Duration::from_secs(self.core_idle_delay_secs)
    }

    /// Extended idle delay as a [`Duration`].
    #[must_use]
    pub fn extended_idle_delay(&self) -> Duration {
        Duration::from_secs(self.extended_idle_delay_secs)
    }

    /// Failure tracking cap as a list length.
    #[must_use]
    pub fn max_tracked(&self) -> usize {
        usize::try_from(self.max_tracked_failures).unwrap_or(usize::MAX)
    }
}

/// Load/save contract for settings persistence.
///
/// Implementations own the storage format; the scheduler only ever
/// calls these two operations with full snapshots.
pub trait SettingsStore: Send + Sync {
    /// Load the persisted settings snapshot.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the snapshot cannot be read or
    /// fails validation.
    fn load(&self) -> Result<SchedulerSettings>;

    /// Persist a full settings snapshot, replacing the previous one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the snapshot cannot be written.
    fn save(&self, settings: &SchedulerSettings) -> Result<()>;
}

/// TOML-file-backed [`SettingsStore`].
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    /// Create a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self) -> Result<SchedulerSettings> {
        let settings = SchedulerSettings::load_from_path(&self.path)?;
        info!(path = %self.path.display(), "settings loaded");
        Ok(settings)
    }

    fn save(&self, settings: &SchedulerSettings) -> Result<()> {
        let raw = toml::to_string_pretty(settings)?;
        fs::write(&self.path, raw)
            .map_err(|err| AppError::Store(format!("failed to write settings: {err}")))?;
        info!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}
