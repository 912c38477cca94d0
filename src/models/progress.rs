//! Live progress snapshot for a running tier.

use serde::{Deserialize, Serialize};

/// A progress report from a running tier.
///
/// `current` is monotonically non-decreasing within one run attempt;
/// when a run resumes it restarts at the checkpoint value, not zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub struct Progress {
    /// Units of work completed so far.
    pub current: u64,
    /// Total units of work in this run.
    pub total: u64,
    /// Human-readable description of the current unit.
    pub label: String,
    /// Estimated time to completion, if the workload can compute one.
    pub eta_ms: Option<u64>,
}

impl Progress {
    /// Construct a progress snapshot without an ETA.
    #[must_use]
    pub fn new(current: u64, total: u64, label: impl Into<String>) -> Self {
        Self {
            current,
            total,
            label: label.into(),
            eta_ms: None,
        }
    }

    /// Completion ratio in `[0.0, 1.0]`; zero when `total` is zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}
