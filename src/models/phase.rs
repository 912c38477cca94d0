//! Pipeline phase and tier enumerations.

use serde::{Deserialize, Serialize};

/// Current stage of the tiered verification pipeline.
///
/// Exactly one value is current per scheduler instance. `Complete` and
/// `Stalled` are terminal until an explicit re-run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No run has started.
    Idle,
    /// The synchronous smoke tier is executing.
    Smoke,
    /// Smoke finished; waiting for the core idle delay.
    CorePending,
    /// The core tier is executing in an isolated channel.
    CoreRunning,
    /// Core finished; waiting for the extended idle delay.
    ExtendedPending,
    /// The extended tier is executing in an isolated channel.
    ExtendedRunning,
    /// The pipeline finished, errored, or was cancelled.
    Complete,
    /// A watched tier exceeded the auto-resume bound.
    Stalled,
}

impl Phase {
    /// Whether a tier is currently executing in this phase.
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, Self::Smoke | Self::CoreRunning | Self::ExtendedRunning)
    }

    /// Whether this phase requires an explicit re-run to leave.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Stalled)
    }
}

/// One of the three verification workloads.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Instant, synchronous, in-process.
    Smoke,
    /// Moderate cost, isolated.
    Core,
    /// Heaviest, isolated and resumable.
    Extended,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Smoke => write!(f, "smoke"),
            Self::Core => write!(f, "core"),
            Self::Extended => write!(f, "extended"),
        }
    }
}
