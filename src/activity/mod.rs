//! Activity signal plumbing and idle-deadline timers.
//!
//! [`ActivitySource`] is the environment-agnostic entry point the host
//! wires real input events into; [`ActivityMonitor`] debounces those
//! signals into a single idle-deadline callback.

pub mod monitor;
pub mod source;

pub use monitor::{ActivityMonitor, ActivityMonitorHandle};
pub use source::ActivitySource;
