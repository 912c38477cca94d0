//! Isolated execution of tier workloads.
//!
//! Covers the wire-shaped message protocol, the task-backed
//! [`ExecutionChannel`], the [`TierWorkload`]/[`SmokeSuite`] seams the
//! real tier bodies plug into, and deterministic simulated workloads.

pub mod protocol;
pub mod sim;
pub mod worker;

pub use protocol::{ChannelEnvelope, ChannelMessage, ChannelRequest, RunRequest};
pub use worker::{ExecutionChannel, ProgressReporter, SmokeSuite, TierWorkload};
