#![forbid(unsafe_code)]

//! `tiersched` — idle-triggered tiered verification scheduler binary.
//!
//! Bootstraps configuration and tracing, builds a [`PhaseScheduler`]
//! over simulated tier workloads, and either runs the full pipeline
//! once or activates the idle-triggered auto pipeline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use tiersched::channel::sim::{SimSmoke, SimWorkload};
use tiersched::config::SchedulerSettings;
use tiersched::scheduler::{SchedulerBuilder, SchedulerEvent};
use tiersched::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "tiersched", about = "Idle-triggered tiered verification scheduler", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file; defaults apply if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Run the full pipeline immediately instead of waiting for idle.
    #[arg(long)]
    run_all: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("tiersched bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let settings = match &args.config {
        Some(path) => SchedulerSettings::load_from_path(path)?,
        None => SchedulerSettings::default(),
    };
    info!(
        auto_run = settings.auto_run_enabled,
        core_idle_secs = settings.core_idle_delay_secs,
        extended_idle_secs = settings.extended_idle_delay_secs,
        "configuration loaded"
    );

    // ── Build the scheduler over simulated tiers ────────
    let scheduler = SchedulerBuilder::new(
        settings,
        Arc::new(SimSmoke::new(25)),
        Arc::new(SimWorkload::new("core", 40, Duration::from_millis(250))),
        Arc::new(SimWorkload::new("extended", 200, Duration::from_millis(500))),
    )
    .build();

    // ── Log the event stream ────────────────────────────
    let mut events = scheduler.subscribe();
    let reporter = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SchedulerEvent::PhaseChanged(phase) => info!(?phase, "phase"),
                SchedulerEvent::Progress { tier, progress } => info!(
                    %tier,
                    current = progress.current,
                    total = progress.total,
                    label = progress.label,
                    eta_ms = progress.eta_ms,
                    "progress"
                ),
                SchedulerEvent::TierFinished { tier, outcome } => info!(
                    %tier,
                    passed = outcome.passed,
                    failed = outcome.failed,
                    duration_ms = outcome.duration_ms,
                    "tier finished"
                ),
                SchedulerEvent::TierFailed { tier, message } => {
                    warn!(%tier, message, "tier failed");
                }
                SchedulerEvent::StallDetected { state } => warn!(
                    stall_count = state.stall_count,
                    resume_attempts = state.resume_attempts,
                    "stall detected"
                ),
                SchedulerEvent::PermanentStall { state } => warn!(
                    stall_count = state.stall_count,
                    "permanent stall, manual re-run required"
                ),
                SchedulerEvent::Completed { outcome } => info!(
                    passed = outcome.passed,
                    failed = outcome.failed,
                    "pipeline complete"
                ),
            }
        }
    });

    // ── Drive the pipeline ──────────────────────────────
    if args.run_all {
        tokio::select! {
            result = scheduler.run_all() => match result {
                Ok(outcome) => info!(passed = outcome.passed, failed = outcome.failed, "run-all finished"),
                Err(err) => warn!(%err, "run-all did not complete"),
            },
            () = shutdown_signal() => {
                info!("shutdown signal received, cancelling");
                scheduler.cancel().await?;
            }
        }
    } else {
        scheduler.activate().await?;
        info!("auto pipeline armed; press ctrl-c to exit");
        shutdown_signal().await;
        info!("shutdown signal received, cancelling");
        scheduler.cancel().await?;
    }

    scheduler.shutdown();
    reporter.abort();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "ctrl-c signal handler failed");
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
