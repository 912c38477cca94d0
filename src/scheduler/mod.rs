//! Phase orchestration: state machine, idle chains, and liveness.

pub mod events;
pub mod phase_scheduler;
pub mod watchdog;

pub use events::{SchedulerEvent, SchedulerSnapshot};
pub use phase_scheduler::{PhaseScheduler, SchedulerBuilder};
pub use watchdog::{StallSignal, StallWatchdog};
