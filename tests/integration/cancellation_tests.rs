//! Integration tests for cancellation, supersession, and disposal.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use tiersched::models::{Phase, Tier};
use tiersched::scheduler::SchedulerEvent;
use tiersched::AppError;

use super::test_helpers::{
    build_scheduler, drain_events, fast_settings, paced, resume_points, wait_for_phase,
};

#[tokio::test(start_paused = true)]
async fn cancel_is_idempotent_and_safe_while_idle() {
    let (scheduler, _core, _ext) =
        build_scheduler(fast_settings(), paced("core", 3), paced("extended", 3));

    scheduler.cancel().await.expect("first cancel");
    scheduler.cancel().await.expect("second cancel");
    // Nothing ever ran, so the pipeline stays idle.
    assert_eq!(scheduler.phase(), Phase::Idle);

    // Once anything has run, repeated cancels settle on Complete.
    scheduler.run_smoke().await.expect("smoke");
    scheduler.cancel().await.expect("third cancel");
    assert_eq!(scheduler.phase(), Phase::Complete);
    scheduler.cancel().await.expect("fourth cancel");
    assert_eq!(scheduler.phase(), Phase::Complete);
}

#[tokio::test(start_paused = true)]
async fn cancel_preempts_a_running_core_tier() {
    let (scheduler, _core, _ext) =
        build_scheduler(fast_settings(), paced("core", 1000), paced("extended", 3));
    let scheduler = Arc::new(scheduler);
    let mut events = scheduler.subscribe();

    let runner = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.run_core().await })
    };
    wait_for_phase(&mut events, Phase::CoreRunning).await;

    scheduler.cancel().await.expect("cancel");
    let result = runner.await.expect("runner task");
    assert!(matches!(result, Err(AppError::Cancelled(_))), "got {result:?}");
    assert_eq!(scheduler.phase(), Phase::Complete);

    // No late completion may be applied after the cancel.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(
        !drain_events(&mut events).iter().any(|event| matches!(
            event,
            SchedulerEvent::TierFinished { tier: Tier::Core, .. }
        )),
        "a cancelled run must not report completion"
    );
    assert_eq!(scheduler.phase(), Phase::Complete);
}

#[tokio::test(start_paused = true)]
async fn cancel_then_rerun_uses_a_fresh_channel() {
    let (scheduler, core_requests, _ext) =
        build_scheduler(fast_settings(), paced("core", 5), paced("extended", 3));
    let scheduler = Arc::new(scheduler);
    let mut events = scheduler.subscribe();

    let runner = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.run_core().await })
    };
    wait_for_phase(&mut events, Phase::CoreRunning).await;
    scheduler.cancel().await.expect("cancel");
    assert!(runner.await.expect("runner task").is_err());

    // The pipeline accepts a fresh run after the cancel.
    let outcome = scheduler.run_core().await.expect("second run");
    assert_eq!(outcome.passed, 5);
    assert_eq!(resume_points(&core_requests), vec![0, 0]);
}

#[tokio::test(start_paused = true)]
async fn a_new_run_supersedes_the_previous_pending_one() {
    let (scheduler, core_requests, _ext) =
        build_scheduler(fast_settings(), paced("core", 5), paced("extended", 3));
    let scheduler = Arc::new(scheduler);
    let mut events = scheduler.subscribe();

    let first = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.run_core().await })
    };
    wait_for_phase(&mut events, Phase::CoreRunning).await;

    let second = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.run_core().await })
    };

    // The superseded caller is told, the new run proceeds to completion.
    let first = first.await.expect("first runner");
    assert!(matches!(first, Err(AppError::Cancelled(_))), "got {first:?}");
    let second = second.await.expect("second runner").expect("second run");
    assert_eq!(second.passed, 5);
    assert_eq!(resume_points(&core_requests), vec![0, 0]);
}

#[tokio::test(start_paused = true)]
async fn cancel_disarms_a_pending_idle_chain() {
    let (scheduler, core_requests, _ext) =
        build_scheduler(fast_settings(), paced("core", 5), paced("extended", 3));
    let mut events = scheduler.subscribe();

    scheduler.activate().await.expect("activate");
    wait_for_phase(&mut events, Phase::CorePending).await;

    scheduler.cancel().await.expect("cancel");
    assert_eq!(scheduler.phase(), Phase::Complete);

    // Well past the idle delay: the disarmed timer must not fire.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(resume_points(&core_requests).is_empty());
    assert!(
        !drain_events(&mut events)
            .iter()
            .any(|event| matches!(event, SchedulerEvent::PhaseChanged(Phase::CoreRunning))),
        "the cancelled idle chain must not start the core tier"
    );
}

#[tokio::test(start_paused = true)]
async fn operations_after_shutdown_report_disposed() {
    let (scheduler, _core, _ext) =
        build_scheduler(fast_settings(), paced("core", 3), paced("extended", 3));

    scheduler.shutdown();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let result = scheduler.run_smoke().await;
    assert!(matches!(result, Err(AppError::Disposed(_))), "got {result:?}");
    let result = scheduler.cancel().await;
    assert!(matches!(result, Err(AppError::Disposed(_))));
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_the_event_loop() {
    let (scheduler, core_requests, _ext) =
        build_scheduler(fast_settings(), paced("core", 1000), paced("extended", 3));
    let mut events = scheduler.subscribe();

    scheduler.activate().await.expect("activate");
    wait_for_phase(&mut events, Phase::CorePending).await;
    drop(scheduler);

    // The idle chain dies with the scheduler.
    let result = timeout(Duration::from_secs(60), async {
        loop {
            if events.recv().await.is_err() {
                return;
            }
        }
    })
    .await;
    assert!(result.is_ok(), "event stream should close after drop");
    assert!(resume_points(&core_requests).is_empty());
}
