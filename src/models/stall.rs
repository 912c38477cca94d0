//! Stall tracking state for a resumable run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Liveness state maintained by the watchdog for one logical run.
///
/// Invariant: `resume_attempts` never exceeds the configured auto-resume
/// bound. Once the bound is hit, `is_stalled` stays set until an
/// explicit manual re-run resets the state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub struct StallState {
    /// Whether the run is currently considered stalled.
    pub is_stalled: bool,
    /// Number of stalls detected over the logical run.
    pub stall_count: u32,
    /// When the most recent stall was detected.
    pub last_stall_at: Option<DateTime<Utc>>,
    /// Auto-resume attempts consumed so far.
    pub resume_attempts: u32,
}

impl StallState {
    /// Whether the auto-resume bound has been exhausted.
    #[must_use]
    pub fn is_exhausted(&self, max_auto_resumes: u32) -> bool {
        self.resume_attempts >= max_auto_resumes
    }
}
