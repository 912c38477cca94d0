//! Per-tier run results and failure records.

use serde::{Deserialize, Serialize};

/// A single recorded failure inside a tier run.
///
/// The scheduler treats failure content as pass-through data; it never
/// interprets it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct FailureRecord {
    /// Index of the failed unit within the run.
    pub index: u64,
    /// Name of the failed unit.
    pub name: String,
    /// Failure message reported by the workload.
    pub message: String,
}

/// Result of one tier run, possibly accumulated across resumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub struct RunOutcome {
    /// Units that passed.
    pub passed: u64,
    /// Units that failed.
    pub failed: u64,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Recorded failures, capped at the tracking limit.
    pub failures: Vec<FailureRecord>,
    /// Opaque workload payload, passed through untouched.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl RunOutcome {
    /// Merge a later attempt's outcome into this one, additively.
    ///
    /// Summary counters are summed and failure lists concatenated, so
    /// totals accumulate across watchdog-triggered resumes instead of
    /// being replaced. The failure list is capped at `max_tracked`.
    pub fn merge(&mut self, other: Self, max_tracked: usize) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.duration_ms += other.duration_ms;
        self.failures.extend(other.failures);
        self.failures.truncate(max_tracked);
        if !other.payload.is_null() {
            self.payload = other.payload;
        }
    }

    /// Total units accounted for.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.passed + self.failed
    }
}
