#![forbid(unsafe_code)]

//! `tiersched` — idle-triggered tiered verification scheduler.
//!
//! Runs increasingly expensive verification tiers (smoke, core,
//! extended) automatically once the host has been inactive for a
//! configurable period. Expensive tiers execute in isolated channels
//! with live progress, stall detection, and bounded checkpointed
//! auto-resume.

pub mod activity;
pub mod channel;
pub mod config;
pub mod errors;
pub mod models;
pub mod scheduler;

pub use config::SchedulerSettings;
pub use errors::{AppError, Result};
