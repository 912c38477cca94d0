//! Execution channel message protocol.
//!
//! Language-agnostic message shapes exchanged with an isolated unit of
//! work. All communication between the scheduler and a running tier
//! flows through these messages; there is no shared memory.

use serde::{Deserialize, Serialize};

use crate::models::{FailureRecord, Progress, RunOutcome, Tier};

/// Parameters for one run attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RunRequest {
    /// Cap on tracked failure records.
    pub max_failures: u32,
    /// Units processed per batch.
    pub batch_size: u32,
    /// 1-based unit index to resume from; 0 starts fresh.
    pub resume_from: u64,
}

/// Request sent into an execution channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelRequest {
    /// Start a run attempt.
    Run(RunRequest),
    /// Abandon the current run.
    Cancel,
}

/// Asynchronous response from an execution channel.
///
/// Exactly one of `Done` or `Error` is delivered per accepted
/// [`ChannelRequest::Run`], unless the channel is terminated first, in
/// which case neither fires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelMessage {
    /// A progress heartbeat.
    Progress {
        /// Last completed unit index (1-based).
        current: u64,
        /// Total units in this run.
        total: u64,
        /// Description of the current unit.
        label: String,
        /// Estimated remaining time, if known.
        eta_ms: Option<u64>,
    },
    /// The run attempt finished.
    Done {
        /// Units that passed.
        passed: u64,
        /// Units that failed.
        failed: u64,
        /// Attempt duration in milliseconds.
        duration_ms: u64,
        /// Recorded failures.
        failures: Vec<FailureRecord>,
        /// Opaque workload payload.
        #[serde(default)]
        payload: serde_json::Value,
    },
    /// The run attempt failed.
    Error {
        /// Workload-reported failure message.
        message: String,
    },
}

impl ChannelMessage {
    /// Wrap a run outcome as a `Done` message.
    #[must_use]
    pub fn done(outcome: RunOutcome) -> Self {
        Self::Done {
            passed: outcome.passed,
            failed: outcome.failed,
            duration_ms: outcome.duration_ms,
            failures: outcome.failures,
            payload: outcome.payload,
        }
    }

    /// Extract the progress snapshot from a `Progress` message.
    #[must_use]
    pub fn as_progress(&self) -> Option<Progress> {
        if let Self::Progress {
            current,
            total,
            label,
            eta_ms,
        } = self
        {
            Some(Progress {
                current: *current,
                total: *total,
                label: label.clone(),
                eta_ms: *eta_ms,
            })
        } else {
            None
        }
    }

    /// Extract the run outcome from a `Done` message.
    #[must_use]
    pub fn into_outcome(self) -> Option<RunOutcome> {
        if let Self::Done {
            passed,
            failed,
            duration_ms,
            failures,
            payload,
        } = self
        {
            Some(RunOutcome {
                passed,
                failed,
                duration_ms,
                failures,
                payload,
            })
        } else {
            None
        }
    }
}

/// A channel message tagged with its origin tier and channel epoch.
///
/// The epoch is a generation counter assigned when a channel is opened;
/// the scheduler discards messages whose epoch no longer matches the
/// channel it currently accepts, which closes the race between a cancel
/// and an in-flight completion.
#[derive(Debug, Clone)]
pub struct ChannelEnvelope {
    /// Tier the message belongs to.
    pub tier: Tier,
    /// Channel generation the message was produced under.
    pub epoch: u64,
    /// The message itself.
    pub message: ChannelMessage,
}
