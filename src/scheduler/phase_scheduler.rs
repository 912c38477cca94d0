//! The phase scheduler: tiered pipeline orchestration.
//!
//! Owns the phase state machine, drives idle monitors, opens and closes
//! execution channels, wires a stall watchdog to the currently running
//! channel, and exposes run/cancel/subscribe operations.
//!
//! All state transitions happen inside one event-loop task, reacting to
//! discrete events (commands, timer fires, channel messages, watchdog
//! signals); they never run concurrently for the same scheduler
//! instance. Workloads execute in their own channel tasks.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::activity::{ActivityMonitor, ActivityMonitorHandle, ActivitySource};
use crate::channel::{
    ChannelEnvelope, ChannelMessage, ChannelRequest, ExecutionChannel, RunRequest, SmokeSuite,
    TierWorkload,
};
use crate::config::SchedulerSettings;
use crate::models::{Phase, Progress, RunOutcome, StallState, Tier};
use crate::{AppError, Result};

use super::events::{SchedulerEvent, SchedulerSnapshot};
use super::watchdog::{StallSignal, StallWatchdog};

const EVENT_CAPACITY: usize = 64;
const MESSAGE_CAPACITY: usize = 64;

/// Builder for a [`PhaseScheduler`].
pub struct SchedulerBuilder {
    settings: SchedulerSettings,
    smoke: Arc<dyn SmokeSuite>,
    core: Arc<dyn TierWorkload>,
    extended: Arc<dyn TierWorkload>,
    activity: ActivitySource,
}

impl SchedulerBuilder {
    /// Start a builder over a pre-validated settings snapshot and the
    /// three tier workloads.
    #[must_use]
    pub fn new(
        settings: SchedulerSettings,
        smoke: Arc<dyn SmokeSuite>,
        core: Arc<dyn TierWorkload>,
        extended: Arc<dyn TierWorkload>,
    ) -> Self {
        Self {
            settings,
            smoke,
            core,
            extended,
            activity: ActivitySource::new(),
        }
    }

    /// Share an existing activity source instead of creating one.
    #[must_use]
    pub fn activity_source(mut self, activity: ActivitySource) -> Self {
        self.activity = activity;
        self
    }

    /// Spawn the scheduler's event loop and return its handle.
    #[must_use]
    pub fn build(self) -> PhaseScheduler {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (snapshot_tx, snapshot_rx) = watch::channel(SchedulerSnapshot::default());
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (msg_tx, msg_rx) = mpsc::channel(MESSAGE_CAPACITY);
        let (idle_tx, idle_rx) = mpsc::channel(4);
        let (stall_tx, stall_rx) = mpsc::channel(4);
        let shutdown = CancellationToken::new();

        let core = SchedulerCore {
            settings: self.settings,
            smoke: self.smoke,
            core_workload: self.core,
            extended_workload: self.extended,
            activity: self.activity.clone(),
            snapshot_tx,
            events_tx: events_tx.clone(),
            msg_tx,
            idle_tx,
            stall_tx,
            epoch: 0,
            core_run: TierRun::default(),
            ext_run: TierRun::default(),
            core_monitor: None,
            ext_monitor: None,
            has_run: false,
        };

        let loop_shutdown = shutdown.clone();
        tokio::spawn(
            core.run(cmd_rx, msg_rx, idle_rx, stall_rx, loop_shutdown)
                .instrument(info_span!("phase_scheduler")),
        );

        PhaseScheduler {
            cmd_tx,
            snapshot_rx,
            events_tx,
            activity: self.activity,
            shutdown,
        }
    }
}

/// Handle over a running scheduler instance.
///
/// Read accessors come from a watch-backed snapshot; all mutations
/// route through the internal event loop. Dropping the handle disposes
/// the scheduler (timers, channels, watchdogs).
pub struct PhaseScheduler {
    cmd_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<SchedulerSnapshot>,
    events_tx: broadcast::Sender<SchedulerEvent>,
    activity: ActivitySource,
    shutdown: CancellationToken,
}

enum Command {
    Activate {
        ack: oneshot::Sender<()>,
    },
    RunSmoke {
        reply: oneshot::Sender<RunOutcome>,
    },
    RunCore {
        reply: oneshot::Sender<Result<RunOutcome>>,
    },
    RunExtended {
        resume_from: u64,
        reply: oneshot::Sender<Result<RunOutcome>>,
    },
    Cancel {
        ack: oneshot::Sender<()>,
    },
}

impl PhaseScheduler {
    /// The activity source monitors of this scheduler listen to.
    #[must_use]
    pub fn activity(&self) -> ActivitySource {
        self.activity.clone()
    }

    /// First activation: if auto-run is enabled, runs the smoke tier
    /// and arms the core idle monitor.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Disposed`] if the scheduler was shut down.
    pub async fn activate(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(Command::Activate { ack }).await?;
        done.await.map_err(disposed)
    }

    /// Execute the cheap, synchronous smoke tier.
    ///
    /// Never suspends on workload execution; always produces an outcome.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Disposed`] if the scheduler was shut down.
    pub async fn run_smoke(&self) -> Result<RunOutcome> {
        let (reply, done) = oneshot::channel();
        self.send(Command::RunSmoke { reply }).await?;
        done.await.map_err(disposed)
    }

    /// Run the core tier in an isolated channel; resolves on `Done`,
    /// `Error`, or preemption by [`cancel`](Self::cancel).
    ///
    /// Cancels any previous core channel first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Channel`] on a channel error,
    /// [`AppError::PermanentStall`] past the auto-resume bound,
    /// [`AppError::Cancelled`] on preemption, or
    /// [`AppError::Disposed`] if the scheduler was shut down.
    pub async fn run_core(&self) -> Result<RunOutcome> {
        let (reply, done) = oneshot::channel();
        self.send(Command::RunCore { reply }).await?;
        done.await.map_err(disposed)?
    }

    /// Run the extended tier, resuming from `resume_from` (0 = fresh).
    ///
    /// Terminates only its own previous channel — a concurrently open
    /// core channel is deliberately untouched, so a manual extended run
    /// works independently of the automatic core pipeline. A fresh run
    /// resets accumulated summary and failure state; `resume_from > 0`
    /// preserves and additively merges it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Channel`] on a channel error,
    /// [`AppError::PermanentStall`] past the auto-resume bound,
    /// [`AppError::Cancelled`] on preemption, or
    /// [`AppError::Disposed`] if the scheduler was shut down.
    pub async fn run_extended(&self, resume_from: u64) -> Result<RunOutcome> {
        let (reply, done) = oneshot::channel();
        self.send(Command::RunExtended { resume_from, reply }).await?;
        done.await.map_err(disposed)?
    }

    /// Run the full pipeline: smoke, then core, then extended.
    ///
    /// Stops early if core errors, stalls permanently, or is cancelled.
    ///
    /// # Errors
    ///
    /// Propagates the first tier failure; see [`run_core`](Self::run_core)
    /// and [`run_extended`](Self::run_extended).
    pub async fn run_all(&self) -> Result<RunOutcome> {
        self.run_smoke().await?;
        self.run_core().await?;
        self.run_extended(0).await
    }

    /// Terminate open channels, stop watchdogs, cancel pending idle
    /// monitors, and force the terminal phase.
    ///
    /// Idempotent and safe from any state; a completion arriving after
    /// the cancel is discarded, never applied.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Disposed`] if the scheduler was shut down.
    pub async fn cancel(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(Command::Cancel { ack }).await?;
        done.await.map_err(disposed)
    }

    /// Subscribe to the scheduler's event stream.
    ///
    /// Dropping the receiver unsubscribes. Events are delivered in
    /// order per subscriber.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.events_tx.subscribe()
    }

    /// Current pipeline phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.snapshot_rx.borrow().phase
    }

    /// Most recent progress report, with its tier.
    #[must_use]
    pub fn progress(&self) -> Option<(Tier, Progress)> {
        self.snapshot_rx.borrow().progress.clone()
    }

    /// Stall bookkeeping for the most recently watched run.
    #[must_use]
    pub fn stall_state(&self) -> StallState {
        self.snapshot_rx.borrow().stall.clone()
    }

    /// Dispose the scheduler: cancels all timers and channels and stops
    /// the event loop.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    async fn send(&self, cmd: Command) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| AppError::Disposed("scheduler event loop has stopped".into()))
    }
}

impl Drop for PhaseScheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn disposed<E>(_: E) -> AppError {
    AppError::Disposed("scheduler event loop has stopped".into())
}

/// Per-tier state for an isolated (channel-backed) run.
#[derive(Default)]
struct TierRun {
    chan: Option<ExecutionChannel>,
    /// Epoch of the currently accepted channel; 0 = none.
    epoch: u64,
    pending: Option<oneshot::Sender<Result<RunOutcome>>>,
    /// Watchdog for the current logical run; persists across resumes.
    watchdog: Option<StallWatchdog>,
    /// Outcome accumulated additively across resumes.
    accumulated: RunOutcome,
    run_id: Option<String>,
}

impl TierRun {
    fn resolve(&mut self, result: Result<RunOutcome>) {
        if let Some(reply) = self.pending.take() {
            let _ = reply.send(result);
        }
    }

    fn abandon(&mut self, reason: &str) {
        if let Some(chan) = self.chan.take() {
            chan.terminate();
        }
        self.epoch = 0;
        if let Some(watchdog) = &self.watchdog {
            watchdog.stop();
        }
        self.resolve(Err(AppError::Cancelled(reason.into())));
    }
}

/// Event-loop state. Lives inside the spawned scheduler task.
struct SchedulerCore {
    settings: SchedulerSettings,
    smoke: Arc<dyn SmokeSuite>,
    core_workload: Arc<dyn TierWorkload>,
    extended_workload: Arc<dyn TierWorkload>,
    activity: ActivitySource,
    snapshot_tx: watch::Sender<SchedulerSnapshot>,
    events_tx: broadcast::Sender<SchedulerEvent>,
    msg_tx: mpsc::Sender<ChannelEnvelope>,
    idle_tx: mpsc::Sender<Tier>,
    stall_tx: mpsc::Sender<StallSignal>,
    /// Generation counter; bumped for every opened channel.
    epoch: u64,
    core_run: TierRun,
    ext_run: TierRun,
    core_monitor: Option<ActivityMonitorHandle>,
    ext_monitor: Option<ActivityMonitorHandle>,
    has_run: bool,
}

impl SchedulerCore {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<Command>,
        mut msg_rx: mpsc::Receiver<ChannelEnvelope>,
        mut idle_rx: mpsc::Receiver<Tier>,
        mut stall_rx: mpsc::Receiver<StallSignal>,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    debug!("disposing scheduler");
                    self.cancel_all();
                    return;
                }
                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        debug!("all handles dropped, disposing scheduler");
                        self.cancel_all();
                        return;
                    }
                },
                Some(envelope) = msg_rx.recv() => self.handle_channel_message(envelope),
                Some(tier) = idle_rx.recv() => self.handle_idle_fired(tier).await,
                Some(signal) = stall_rx.recv() => self.handle_stall_signal(signal).await,
            }
        }
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Activate { ack } => {
                if self.settings.auto_run_enabled && self.phase() == Phase::Idle {
                    info!("auto-run enabled, starting idle pipeline");
                    self.run_smoke_tier();
                    self.arm_idle_monitor(Tier::Core);
                } else {
                    debug!("activation is a no-op (auto-run disabled or already run)");
                }
                let _ = ack.send(());
            }
            Command::RunSmoke { reply } => {
                let outcome = self.run_smoke_tier();
                let _ = reply.send(outcome);
            }
            Command::RunCore { reply } => {
                self.start_isolated(Tier::Core, 0, Some(reply)).await;
            }
            Command::RunExtended { resume_from, reply } => {
                self.start_isolated(Tier::Extended, resume_from, Some(reply))
                    .await;
            }
            Command::Cancel { ack } => {
                self.cancel_all();
                let _ = ack.send(());
            }
        }
    }

    // ── Smoke ────────────────────────────────────────────

    fn run_smoke_tier(&mut self) -> RunOutcome {
        self.set_phase(Phase::Smoke);
        self.has_run = true;
        let outcome = self.smoke.run();
        info!(
            passed = outcome.passed,
            failed = outcome.failed,
            "smoke tier finished"
        );
        self.publish(SchedulerEvent::TierFinished {
            tier: Tier::Smoke,
            outcome: outcome.clone(),
        });
        self.set_phase(Phase::CorePending);
        outcome
    }

    // ── Isolated tiers (core / extended) ─────────────────

    /// Open a channel for an isolated tier run, wiring the watchdog.
    ///
    /// `resume_from == 0` starts a fresh logical run (accumulated
    /// outcome and stall state reset); `resume_from > 0` continues the
    /// current one, preserving both.
    async fn start_isolated(
        &mut self,
        tier: Tier,
        resume_from: u64,
        reply: Option<oneshot::Sender<Result<RunOutcome>>>,
    ) {
        self.epoch += 1;
        let epoch = self.epoch;
        let workload = match tier {
            Tier::Core => Arc::clone(&self.core_workload),
            Tier::Extended => Arc::clone(&self.extended_workload),
            Tier::Smoke => return,
        };
        let msg_tx = self.msg_tx.clone();
        let stall_tx = self.stall_tx.clone();
        let watchdog_cfg = self.settings.watchdog;
        let request = RunRequest {
            max_failures: self.settings.max_tracked_failures,
            batch_size: self.settings.extended_batch_size,
            resume_from,
        };
        self.has_run = true;

        // An explicit or resumed start supersedes the tier's idle timer.
        if let Some(monitor) = self.take_monitor(tier) {
            monitor.cancel();
        }

        let run = self.tier_run_mut(tier);
        // A re-run terminates only this tier's previous channel.
        if let Some(chan) = run.chan.take() {
            chan.terminate();
        }
        if let Some(new_reply) = reply {
            run.resolve(Err(AppError::Cancelled("superseded by a new run".into())));
            run.pending = Some(new_reply);
        }

        let fresh = resume_from == 0 || run.watchdog.is_none();
        if fresh {
            run.accumulated = RunOutcome::default();
            run.run_id = Some(Uuid::new_v4().to_string());
            run.watchdog = Some(StallWatchdog::new(tier, watchdog_cfg));
        }
        if let Some(watchdog) = run.watchdog.as_mut() {
            watchdog.start(stall_tx);
        }

        let chan = ExecutionChannel::open(tier, epoch, workload, msg_tx);
        info!(
            %tier,
            epoch,
            resume_from,
            run_id = run.run_id.as_deref().unwrap_or(""),
            "dispatching run"
        );
        if let Err(err) = chan.send(ChannelRequest::Run(request)).await {
            warn!(%tier, %err, "channel rejected the run request");
            if let Some(watchdog) = &run.watchdog {
                watchdog.stop();
            }
            run.resolve(Err(err));
            return;
        }
        run.chan = Some(chan);
        run.epoch = epoch;

        if fresh {
            self.update_stall(StallState::default());
        }
        self.set_phase(match tier {
            Tier::Core => Phase::CoreRunning,
            Tier::Extended | Tier::Smoke => Phase::ExtendedRunning,
        });
    }

    fn finish_done(&mut self, tier: Tier, outcome: RunOutcome) {
        let max_tracked = self.settings.max_tracked();
        let notify = self.settings.notify_on_failure;
        let auto = self.settings.auto_run_enabled;

        let run = self.tier_run_mut(tier);
        run.chan = None;
        run.epoch = 0;
        let stall = run.watchdog.as_ref().map(|watchdog| {
            watchdog.stop();
            watchdog.state()
        });
        run.accumulated.merge(outcome, max_tracked);
        let merged = run.accumulated.clone();

        info!(
            %tier,
            passed = merged.passed,
            failed = merged.failed,
            duration_ms = merged.duration_ms,
            "tier finished"
        );
        if merged.failed > 0 && notify {
            warn!(
                %tier,
                failed = merged.failed,
                tracked = merged.failures.len(),
                "run recorded failures"
            );
        }
        if let Some(stall) = stall {
            self.update_stall(stall);
        }
        self.publish(SchedulerEvent::TierFinished {
            tier,
            outcome: merged.clone(),
        });

        match tier {
            Tier::Core => {
                self.set_phase(Phase::ExtendedPending);
                self.core_run.resolve(Ok(merged));
                // The extended idle chain is armed only once core has
                // finished, so the two chains are never pending
                // simultaneously.
                if auto {
                    self.arm_idle_monitor(Tier::Extended);
                }
            }
            Tier::Extended => {
                self.set_phase(Phase::Complete);
                self.publish(SchedulerEvent::Completed {
                    outcome: merged.clone(),
                });
                self.ext_run.resolve(Ok(merged));
            }
            Tier::Smoke => {}
        }
    }

    fn finish_error(&mut self, tier: Tier, message: String) {
        if self.settings.notify_on_failure {
            warn!(%tier, message, "tier failed");
        }
        let run = self.tier_run_mut(tier);
        run.chan = None;
        run.epoch = 0;
        if let Some(watchdog) = &run.watchdog {
            watchdog.stop();
        }
        self.publish(SchedulerEvent::TierFailed {
            tier,
            message: message.clone(),
        });
        // A channel error is terminal for the run; only stalls retry.
        self.set_phase(Phase::Complete);
        self.tier_run_mut(tier)
            .resolve(Err(AppError::Channel(message)));
    }

    // ── Channel messages ─────────────────────────────────

    fn handle_channel_message(&mut self, envelope: ChannelEnvelope) {
        let tier = envelope.tier;
        let accepted = match tier {
            Tier::Core | Tier::Extended => {
                let run = self.tier_run_ref(tier);
                run.epoch != 0 && envelope.epoch == run.epoch
            }
            Tier::Smoke => false,
        };
        if !accepted {
            // A completion racing a cancel or re-run lands here and is
            // discarded, never applied to state.
            debug!(%tier, epoch = envelope.epoch, "discarding stale channel message");
            return;
        }

        match envelope.message {
            message @ ChannelMessage::Progress { .. } => {
                if let Some(progress) = message.as_progress() {
                    let stall = self.tier_run_ref(tier).watchdog.as_ref().map(|watchdog| {
                        watchdog.report_progress(progress.current, &progress.label);
                        watchdog.state()
                    });
                    if let Some(stall) = stall {
                        self.update_stall(stall);
                    }
                    self.snapshot_tx
                        .send_modify(|s| s.progress = Some((tier, progress.clone())));
                    self.publish(SchedulerEvent::Progress { tier, progress });
                }
            }
            message @ ChannelMessage::Done { .. } => {
                if let Some(outcome) = message.into_outcome() {
                    self.finish_done(tier, outcome);
                }
            }
            ChannelMessage::Error { message } => {
                self.finish_error(tier, message);
            }
        }
    }

    // ── Idle chain ───────────────────────────────────────

    fn arm_idle_monitor(&mut self, tier: Tier) {
        let delay = match tier {
            Tier::Core => self.settings.core_idle_delay(),
            Tier::Extended => self.settings.extended_idle_delay(),
            Tier::Smoke => return,
        };
        let tx = self.idle_tx.clone();
        let handle = ActivityMonitor::start(self.activity.subscribe(), delay, move || {
            let _ = tx.try_send(tier);
        });
        match tier {
            Tier::Core => self.core_monitor = Some(handle),
            Tier::Extended => self.ext_monitor = Some(handle),
            Tier::Smoke => {}
        }
        debug!(%tier, delay_secs = delay.as_secs(), "idle monitor armed");
    }

    fn take_monitor(&mut self, tier: Tier) -> Option<ActivityMonitorHandle> {
        match tier {
            Tier::Core => self.core_monitor.take(),
            Tier::Extended => self.ext_monitor.take(),
            Tier::Smoke => None,
        }
    }

    async fn handle_idle_fired(&mut self, tier: Tier) {
        match tier {
            Tier::Core if self.phase() == Phase::CorePending => {
                info!("core idle delay elapsed");
                self.start_isolated(Tier::Core, 0, None).await;
            }
            Tier::Extended if self.phase() == Phase::ExtendedPending => {
                info!("extended idle delay elapsed");
                self.start_isolated(Tier::Extended, 0, None).await;
            }
            tier => {
                debug!(%tier, phase = ?self.phase(), "ignoring idle fire outside its pending phase");
            }
        }
    }

    // ── Stall handling ───────────────────────────────────

    async fn handle_stall_signal(&mut self, signal: StallSignal) {
        match signal {
            StallSignal::Resume {
                tier,
                resume_from,
                state,
            } => {
                if self.tier_run_ref(tier).epoch == 0 {
                    debug!(%tier, "ignoring stall signal for an inactive run");
                    return;
                }
                warn!(
                    %tier,
                    resume_from,
                    attempt = state.resume_attempts,
                    "stall detected, auto-resuming from checkpoint"
                );
                self.update_stall(state.clone());
                self.publish(SchedulerEvent::StallDetected { state });
                // Terminate the stalled channel and reopen at the
                // checkpoint; accumulated totals merge additively.
                self.start_isolated(tier, resume_from, None).await;
            }
            StallSignal::Terminal { tier, state } => {
                if self.tier_run_ref(tier).epoch == 0 {
                    debug!(%tier, "ignoring terminal stall for an inactive run");
                    return;
                }
                warn!(
                    %tier,
                    stall_count = state.stall_count,
                    "auto-resume bound exhausted, stall is permanent"
                );
                let run = self.tier_run_mut(tier);
                if let Some(chan) = run.chan.take() {
                    chan.terminate();
                }
                run.epoch = 0;
                // A fresh watchdog is required for the next manual run.
                run.watchdog = None;
                run.resolve(Err(AppError::PermanentStall(format!(
                    "{tier} run exceeded the auto-resume bound"
                ))));
                self.update_stall(state.clone());
                self.publish(SchedulerEvent::PermanentStall { state });
                self.set_phase(Phase::Stalled);
            }
        }
    }

    // ── Cancellation ─────────────────────────────────────

    fn cancel_all(&mut self) {
        info!("cancel requested");
        self.core_run.abandon("run cancelled");
        self.ext_run.abandon("run cancelled");
        if let Some(monitor) = self.core_monitor.take() {
            monitor.cancel();
        }
        if let Some(monitor) = self.ext_monitor.take() {
            monitor.cancel();
        }
        let phase = if self.has_run {
            Phase::Complete
        } else {
            Phase::Idle
        };
        self.set_phase(phase);
    }

    // ── Shared helpers ───────────────────────────────────

    fn tier_run_ref(&self, tier: Tier) -> &TierRun {
        match tier {
            Tier::Extended => &self.ext_run,
            Tier::Core | Tier::Smoke => &self.core_run,
        }
    }

    fn tier_run_mut(&mut self, tier: Tier) -> &mut TierRun {
        match tier {
            Tier::Extended => &mut self.ext_run,
            Tier::Core | Tier::Smoke => &mut self.core_run,
        }
    }

    fn phase(&self) -> Phase {
        self.snapshot_tx.borrow().phase
    }

    fn set_phase(&self, phase: Phase) {
        if self.phase() == phase {
            return;
        }
        info!(?phase, "phase transition");
        self.snapshot_tx.send_modify(|s| s.phase = phase);
        self.publish(SchedulerEvent::PhaseChanged(phase));
    }

    fn update_stall(&self, state: StallState) {
        self.snapshot_tx.send_modify(|s| s.stall = state);
    }

    fn publish(&self, event: SchedulerEvent) {
        // No subscribers is fine.
        let _ = self.events_tx.send(event);
    }
}
