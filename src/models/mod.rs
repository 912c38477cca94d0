//! Domain model module declarations.

pub mod outcome;
pub mod phase;
pub mod progress;
pub mod stall;

pub use outcome::{FailureRecord, RunOutcome};
pub use phase::{Phase, Tier};
pub use progress::Progress;
pub use stall::StallState;
