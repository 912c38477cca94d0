//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Configuration parsing or range-validation failure.
    Config(String),
    /// Settings persistence failure (load or save).
    Store(String),
    /// The isolated unit of work reported an error or crashed.
    Channel(String),
    /// A run was preempted by an explicit cancel.
    Cancelled(String),
    /// A run exceeded the auto-resume bound and is permanently stalled.
    PermanentStall(String),
    /// The scheduler has already been shut down.
    Disposed(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Store(msg) => write!(f, "store: {msg}"),
            Self::Channel(msg) => write!(f, "channel: {msg}"),
            Self::Cancelled(msg) => write!(f, "cancelled: {msg}"),
            Self::PermanentStall(msg) => write!(f, "permanent stall: {msg}"),
            Self::Disposed(msg) => write!(f, "disposed: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Store(format!("failed to serialize settings: {err}"))
    }
}
