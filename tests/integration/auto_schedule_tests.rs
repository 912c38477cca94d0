//! Integration tests for the idle-triggered automatic pipeline.

use std::time::Duration;

use tokio::time::{timeout, Instant};

use tiersched::models::Phase;
use tiersched::scheduler::SchedulerEvent;

use super::test_helpers::{
    build_scheduler, drain_events, fast_settings, next_phase, paced, resume_points,
    wait_for_phase, EVENT_WAIT,
};

#[tokio::test(start_paused = true)]
async fn idle_delay_starts_the_core_tier_automatically() {
    let (scheduler, core_requests, _ext) =
        build_scheduler(fast_settings(), paced("core", 4), paced("extended", 4));
    let mut events = scheduler.subscribe();
    let started = Instant::now();

    scheduler.activate().await.expect("activate");
    assert_eq!(next_phase(&mut events).await, Phase::Smoke);
    assert_eq!(next_phase(&mut events).await, Phase::CorePending);

    // Nothing runs until the idle delay elapses.
    assert_eq!(next_phase(&mut events).await, Phase::CoreRunning);
    assert!(started.elapsed() >= Duration::from_secs(5));

    assert_eq!(next_phase(&mut events).await, Phase::ExtendedPending);
    assert_eq!(resume_points(&core_requests), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn the_full_pipeline_runs_unattended() {
    let (scheduler, core_requests, ext_requests) =
        build_scheduler(fast_settings(), paced("core", 4), paced("extended", 6));
    let mut events = scheduler.subscribe();

    scheduler.activate().await.expect("activate");

    let mut phases = Vec::new();
    let mut completed = None;
    while completed.is_none() {
        match timeout(EVENT_WAIT, events.recv()).await {
            Ok(Ok(SchedulerEvent::PhaseChanged(phase))) => phases.push(phase),
            Ok(Ok(SchedulerEvent::Completed { outcome })) => completed = Some(outcome),
            Ok(Ok(_)) | Ok(Err(_)) => {}
            Err(_) => panic!("pipeline did not complete"),
        }
    }

    assert_eq!(
        phases,
        vec![
            Phase::Smoke,
            Phase::CorePending,
            Phase::CoreRunning,
            Phase::ExtendedPending,
            Phase::ExtendedRunning,
            Phase::Complete,
        ]
    );
    assert_eq!(completed.expect("outcome").passed, 6);
    assert_eq!(resume_points(&core_requests), vec![0]);
    assert_eq!(resume_points(&ext_requests), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn activity_defers_the_idle_start() {
    let (scheduler, _core, _ext) =
        build_scheduler(fast_settings(), paced("core", 4), paced("extended", 4));
    let activity = scheduler.activity();
    let mut events = scheduler.subscribe();
    let started = Instant::now();

    scheduler.activate().await.expect("activate");
    wait_for_phase(&mut events, Phase::CorePending).await;

    // Activity at t=3 pushes the 5s deadline to t=8.
    tokio::time::sleep(Duration::from_secs(3)).await;
    activity.notify_activity();

    let premature = timeout(Duration::from_secs(4), events.recv()).await;
    assert!(premature.is_err(), "core must not start before t=8");

    assert_eq!(next_phase(&mut events).await, Phase::CoreRunning);
    assert_eq!(started.elapsed().as_secs(), 8);
}

#[tokio::test(start_paused = true)]
async fn disabling_auto_run_makes_activation_a_no_op() {
    let mut settings = fast_settings();
    settings.auto_run_enabled = false;
    let (scheduler, core_requests, _ext) =
        build_scheduler(settings, paced("core", 4), paced("extended", 4));
    let mut events = scheduler.subscribe();

    scheduler.activate().await.expect("activate");
    assert_eq!(scheduler.phase(), Phase::Idle);

    // Long past both idle delays nothing has moved.
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert!(drain_events(&mut events).is_empty());
    assert!(resume_points(&core_requests).is_empty());
    assert_eq!(scheduler.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn manual_tiers_still_work_with_auto_run_disabled() {
    let mut settings = fast_settings();
    settings.auto_run_enabled = false;
    let (scheduler, _core, ext_requests) =
        build_scheduler(settings, paced("core", 4), paced("extended", 4));

    let outcome = scheduler.run_core().await.expect("manual core run");
    assert_eq!(outcome.passed, 4);
    assert_eq!(scheduler.phase(), Phase::ExtendedPending);

    // With auto-run off the extended chain is never armed.
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(resume_points(&ext_requests).is_empty());
    assert_eq!(scheduler.phase(), Phase::ExtendedPending);
}

#[tokio::test(start_paused = true)]
async fn the_extended_chain_arms_only_after_core_finishes() {
    let (scheduler, _core, ext_requests) =
        build_scheduler(fast_settings(), paced("core", 4), paced("extended", 4));
    let mut events = scheduler.subscribe();
    let started = Instant::now();

    scheduler.activate().await.expect("activate");
    wait_for_phase(&mut events, Phase::ExtendedPending).await;
    let core_done_at = started.elapsed();

    wait_for_phase(&mut events, Phase::ExtendedRunning).await;
    // The 30s extended delay counts from core completion, not from
    // activation.
    let waited = started.elapsed() - core_done_at;
    assert!(waited >= Duration::from_secs(30), "waited {waited:?}");
    assert_eq!(resume_points(&ext_requests), vec![0]);
}
