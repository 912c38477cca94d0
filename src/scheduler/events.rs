//! Typed event stream published by the phase scheduler.

use crate::models::{Phase, Progress, RunOutcome, StallState, Tier};

/// Notifications delivered to scheduler subscribers.
///
/// Delivery order is guaranteed per subscriber (the broadcast channel
/// never reorders events for a single receiver); no ordering is
/// guaranteed across subscribers.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// The pipeline moved to a new phase.
    PhaseChanged(Phase),
    /// A running tier reported progress.
    Progress {
        /// Tier the report belongs to.
        tier: Tier,
        /// The progress snapshot.
        progress: Progress,
    },
    /// A tier finished with an outcome, accumulated additively across
    /// any auto-resumes of the same logical run.
    TierFinished {
        /// Tier that finished.
        tier: Tier,
        /// Merged run outcome.
        outcome: RunOutcome,
    },
    /// A tier's channel reported a hard error. Not retried.
    TierFailed {
        /// Tier that failed.
        tier: Tier,
        /// Channel-reported message.
        message: String,
    },
    /// The watchdog detected a stall and granted an auto-resume.
    StallDetected {
        /// Stall bookkeeping after detection.
        state: StallState,
    },
    /// The auto-resume bound is exhausted; manual re-run required.
    PermanentStall {
        /// Final stall bookkeeping.
        state: StallState,
    },
    /// The whole pipeline completed; carries the extended tier's
    /// accumulated outcome.
    Completed {
        /// Accumulated extended outcome.
        outcome: RunOutcome,
    },
}

/// Read-model snapshot backing the scheduler's accessors.
#[derive(Debug, Clone)]
pub struct SchedulerSnapshot {
    /// Current pipeline phase.
    pub phase: Phase,
    /// Most recent progress report, if a tier is (or was) running.
    pub progress: Option<(Tier, Progress)>,
    /// Stall bookkeeping for the most recently watched run.
    pub stall: StallState,
}

impl Default for SchedulerSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            progress: None,
            stall: StallState::default(),
        }
    }
}
