//! Stall watchdog: liveness monitoring with bounded auto-resume.
//!
//! Observes progress heartbeats for one active execution channel and
//! periodically checks the elapsed silence against a threshold. A stall
//! emits a [`StallSignal::Resume`] carrying the next checkpoint, up to
//! the configured attempt bound; past the bound the watchdog stops
//! itself and reports a terminal stall.
//!
//! Detection is purely time-based: it cannot distinguish "slow but
//! healthy" from "hung". Workloads whose single unit can legitimately
//! outlast the threshold will trigger spurious resumes — that is the
//! documented tuning trade-off behind [`WatchdogConfig`].

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

use crate::config::WatchdogConfig;
use crate::models::{StallState, Tier};

/// Signals emitted by the watchdog for scheduler handling.
#[derive(Debug, Clone)]
pub enum StallSignal {
    /// A stall was detected and an auto-resume attempt is granted.
    ///
    /// The receiver is responsible for terminating the stalled channel
    /// and opening a fresh one at `resume_from`, merging partial
    /// outcome totals additively.
    Resume {
        /// Tier whose channel went silent.
        tier: Tier,
        /// Checkpoint to restart from (`last progress + 1`).
        resume_from: u64,
        /// Stall bookkeeping after this detection.
        state: StallState,
    },
    /// The auto-resume bound is exhausted; the stall is permanent until
    /// an explicit manual re-run.
    Terminal {
        /// Tier whose channel went silent.
        tier: Tier,
        /// Final stall bookkeeping.
        state: StallState,
    },
}

struct WatchInner {
    last_progress_at: Instant,
    last_value: u64,
    state: StallState,
}

/// Liveness monitor for one logical (resumable) run of a tier.
pub struct StallWatchdog {
    tier: Tier,
    cfg: WatchdogConfig,
    inner: Arc<Mutex<WatchInner>>,
    check_cancel: CancellationToken,
}

impl StallWatchdog {
    /// Create a watchdog with zeroed stall state.
    #[must_use]
    pub fn new(tier: Tier, cfg: WatchdogConfig) -> Self {
        Self {
            tier,
            cfg,
            inner: Arc::new(Mutex::new(WatchInner {
                last_progress_at: Instant::now(),
                last_value: 0,
                state: StallState::default(),
            })),
            check_cancel: CancellationToken::new(),
        }
    }

    /// Begin the periodic liveness check, replacing any previous one.
    ///
    /// Idempotent in the replace sense: the previous check task is
    /// cancelled, the liveness clock restarts for the new attempt, and
    /// `is_stalled` clears — while `stall_count` and `resume_attempts`
    /// persist across attempts of the same logical run.
    pub fn start(&mut self, signal_tx: mpsc::Sender<StallSignal>) {
        self.check_cancel.cancel();
        self.check_cancel = CancellationToken::new();

        {
            let mut inner = lock(&self.inner);
            inner.last_progress_at = Instant::now();
            inner.state.is_stalled = false;
        }

        let cancel = self.check_cancel.clone();
        let inner = Arc::clone(&self.inner);
        let cfg = self.cfg;
        let tier = self.tier;

        tokio::spawn(
            async move {
                let mut ticker = tokio::time::interval(cfg.check_interval());
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                // The immediate first tick is a no-op check.
                loop {
                    tokio::select! {
                        () = cancel.cancelled() => {
                            debug!(%tier, "watchdog check stopped");
                            return;
                        }
                        _ = ticker.tick() => {}
                    }

                    let signal = {
                        let mut guard = lock(&inner);
                        check_tick(tier, &mut guard, &cfg)
                    };

                    match signal {
                        Some(signal @ StallSignal::Terminal { .. }) => {
                            warn!(%tier, "stall is terminal, stopping watchdog");
                            let _ = signal_tx.send(signal).await;
                            return;
                        }
                        Some(signal) => {
                            let _ = signal_tx.send(signal).await;
                        }
                        None => {}
                    }
                }
            }
            .instrument(info_span!("stall_watchdog")),
        );
    }

    /// Record a progress heartbeat.
    ///
    /// Refreshes the liveness clock and checkpoint value; clears
    /// `is_stalled` if it was set (recovery).
    pub fn report_progress(&self, current: u64, label: &str) {
        let mut inner = lock(&self.inner);
        inner.last_progress_at = Instant::now();
        inner.last_value = current;
        if inner.state.is_stalled {
            debug!(current, label, "progress resumed, clearing stall flag");
            inner.state.is_stalled = false;
        }
    }

    /// Cancel the periodic check. Idempotent.
    pub fn stop(&self) {
        self.check_cancel.cancel();
    }

    /// Current stall bookkeeping snapshot.
    #[must_use]
    pub fn state(&self) -> StallState {
        lock(&self.inner).state.clone()
    }

    /// The checkpoint a resumed run should continue from.
    #[must_use]
    pub fn checkpoint(&self) -> u64 {
        lock(&self.inner).last_value + 1
    }
}

impl Drop for StallWatchdog {
    fn drop(&mut self) {
        self.check_cancel.cancel();
    }
}

/// One liveness check: compare silence against the threshold and decide
/// between auto-resume and terminal stall.
fn check_tick(tier: Tier, inner: &mut WatchInner, cfg: &WatchdogConfig) -> Option<StallSignal> {
    let elapsed = inner.last_progress_at.elapsed();
    if elapsed <= cfg.stall_threshold() || inner.state.is_stalled {
        return None;
    }

    inner.state.is_stalled = true;
    inner.state.stall_count += 1;
    inner.state.last_stall_at = Some(Utc::now());
    warn!(
        %tier,
        elapsed_secs = elapsed.as_secs(),
        stall_count = inner.state.stall_count,
        "no progress within threshold"
    );

    if inner.state.resume_attempts < cfg.max_auto_resumes {
        inner.state.resume_attempts += 1;
        Some(StallSignal::Resume {
            tier,
            resume_from: inner.last_value + 1,
            state: inner.state.clone(),
        })
    } else {
        Some(StallSignal::Terminal {
            tier,
            state: inner.state.clone(),
        })
    }
}

fn lock(inner: &Arc<Mutex<WatchInner>>) -> std::sync::MutexGuard<'_, WatchInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}
