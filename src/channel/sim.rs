//! Deterministic simulated tier workloads.
//!
//! Stand-ins for the real verification tiers (whose content is an
//! external concern). Used by the demo binary and the test suite:
//! paced unit-by-unit progress with injectable per-unit failures, a
//! hang point for exercising the stall watchdog, and a hard error
//! point for exercising channel failure paths.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::models::{FailureRecord, RunOutcome};
use crate::{AppError, Result};

use super::protocol::RunRequest;
use super::worker::{ProgressReporter, SmokeSuite, TierWorkload};

/// Scripted workload processing `total` units at a fixed pace.
///
/// Units are 1-based; a run with `resume_from = n > 0` starts at unit
/// `n`, preserving the checkpoint contract.
pub struct SimWorkload {
    label: String,
    total: u64,
    step_delay: Duration,
    fail_at: Vec<u64>,
    error_at: Option<u64>,
    hang_at: Option<u64>,
    hang_once: bool,
    hung_already: AtomicBool,
}

impl SimWorkload {
    /// A workload that completes all `total` units cleanly.
    #[must_use]
    pub fn new(label: impl Into<String>, total: u64, step_delay: Duration) -> Self {
        Self {
            label: label.into(),
            total,
            step_delay,
            fail_at: Vec::new(),
            error_at: None,
            hang_at: None,
            hang_once: false,
            hung_already: AtomicBool::new(false),
        }
    }

    /// Mark specific 1-based units as failing.
    #[must_use]
    pub fn failing_at(mut self, units: Vec<u64>) -> Self {
        self.fail_at = units;
        self
    }

    /// Report a hard channel error when reaching the given unit.
    #[must_use]
    pub fn erroring_at(mut self, unit: u64) -> Self {
        self.error_at = Some(unit);
        self
    }

    /// Hang (stop reporting progress) when reaching the given unit.
    ///
    /// With `once` set, only the first attempt hangs; a resumed attempt
    /// passes through — the shape of a transient stall.
    #[must_use]
    pub fn hanging_at(mut self, unit: u64, once: bool) -> Self {
        self.hang_at = Some(unit);
        self.hang_once = once;
        self
    }

    fn should_hang(&self, unit: u64) -> bool {
        if self.hang_at != Some(unit) {
            return false;
        }
        if self.hang_once {
            !self.hung_already.swap(true, Ordering::SeqCst)
        } else {
            true
        }
    }
}

impl TierWorkload for SimWorkload {
    fn execute(
        &self,
        request: RunRequest,
        progress: ProgressReporter,
    ) -> Pin<Box<dyn Future<Output = Result<RunOutcome>> + Send + '_>> {
        Box::pin(async move {
            let started = Instant::now();
            let first_unit = if request.resume_from == 0 {
                1
            } else {
                request.resume_from
            };

            let mut outcome = RunOutcome::default();
            for unit in first_unit..=self.total {
                if self.error_at == Some(unit) {
                    return Err(AppError::Channel(format!(
                        "{} unit {unit} crashed",
                        self.label
                    )));
                }
                if self.should_hang(unit) {
                    debug!(label = %self.label, unit, "simulated hang");
                    std::future::pending::<()>().await;
                }

                tokio::time::sleep(self.step_delay).await;

                if self.fail_at.contains(&unit) {
                    outcome.failed += 1;
                    let cap = usize::try_from(request.max_failures).unwrap_or(usize::MAX);
                    if outcome.failures.len() < cap {
                        outcome.failures.push(FailureRecord {
                            index: unit,
                            name: format!("{}-{unit}", self.label),
                            message: "simulated failure".into(),
                        });
                    }
                } else {
                    outcome.passed += 1;
                }

                let remaining = self.total - unit;
                let eta_ms = u64::try_from(self.step_delay.as_millis())
                    .ok()
                    .map(|step| step * remaining);
                progress
                    .report(unit, self.total, &self.label, eta_ms)
                    .await;
            }

            outcome.duration_ms =
                u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            Ok(outcome)
        })
    }
}

/// Instant smoke tier: a fixed number of trivially passing checks.
pub struct SimSmoke {
    checks: u64,
}

impl SimSmoke {
    /// A smoke suite of `checks` passing checks.
    #[must_use]
    pub fn new(checks: u64) -> Self {
        Self { checks }
    }
}

impl SmokeSuite for SimSmoke {
    fn run(&self) -> RunOutcome {
        RunOutcome {
            passed: self.checks,
            ..RunOutcome::default()
        }
    }
}
