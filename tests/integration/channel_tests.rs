//! Integration tests for the task-isolated execution channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use tiersched::channel::sim::SimWorkload;
use tiersched::channel::{
    ChannelEnvelope, ChannelMessage, ChannelRequest, ExecutionChannel, RunRequest,
};
use tiersched::models::Tier;

const WAIT: Duration = Duration::from_secs(600);

fn run_request(resume_from: u64) -> ChannelRequest {
    ChannelRequest::Run(RunRequest {
        max_failures: 10,
        batch_size: 5,
        resume_from,
    })
}

async fn next_envelope(rx: &mut mpsc::Receiver<ChannelEnvelope>) -> ChannelEnvelope {
    timeout(WAIT, rx.recv())
        .await
        .expect("envelope within the wait window")
        .expect("message stream open")
}

#[tokio::test(start_paused = true)]
async fn delivers_progress_heartbeats_then_done() {
    let (msg_tx, mut msg_rx) = mpsc::channel(32);
    let workload = Arc::new(SimWorkload::new("core", 3, Duration::from_secs(1)));
    let chan = ExecutionChannel::open(Tier::Core, 7, workload, msg_tx);
    assert_eq!(chan.tier(), Tier::Core);
    assert_eq!(chan.epoch(), 7);

    chan.send(run_request(0)).await.expect("send run");

    let mut seen = Vec::new();
    for _ in 0..3 {
        let envelope = next_envelope(&mut msg_rx).await;
        assert_eq!(envelope.tier, Tier::Core);
        assert_eq!(envelope.epoch, 7);
        let progress = envelope
            .message
            .as_progress()
            .expect("heartbeats come first");
        assert_eq!(progress.total, 3);
        seen.push(progress.current);
    }
    assert_eq!(seen, vec![1, 2, 3]);

    let envelope = next_envelope(&mut msg_rx).await;
    match envelope.message {
        ChannelMessage::Done { passed, failed, .. } => {
            assert_eq!(passed, 3);
            assert_eq!(failed, 0);
        }
        other => panic!("expected Done, got {other:?}"),
    }

    chan.close().await;
}

#[tokio::test(start_paused = true)]
async fn resumed_run_starts_at_the_checkpoint() {
    let (msg_tx, mut msg_rx) = mpsc::channel(32);
    let workload = Arc::new(SimWorkload::new("extended", 6, Duration::from_secs(1)));
    let chan = ExecutionChannel::open(Tier::Extended, 2, workload, msg_tx);

    chan.send(run_request(4)).await.expect("send run");

    let mut seen = Vec::new();
    for _ in 0..3 {
        let envelope = next_envelope(&mut msg_rx).await;
        let progress = envelope.message.as_progress().expect("heartbeat");
        seen.push(progress.current);
    }
    // Units 1..=3 are skipped entirely.
    assert_eq!(seen, vec![4, 5, 6]);

    let envelope = next_envelope(&mut msg_rx).await;
    match envelope.message {
        ChannelMessage::Done { passed, .. } => assert_eq!(passed, 3),
        other => panic!("expected Done, got {other:?}"),
    }
    chan.close().await;
}

#[tokio::test(start_paused = true)]
async fn workload_error_becomes_an_error_message() {
    let (msg_tx, mut msg_rx) = mpsc::channel(32);
    let workload = Arc::new(SimWorkload::new("core", 5, Duration::from_secs(1)).erroring_at(2));
    let chan = ExecutionChannel::open(Tier::Core, 1, workload, msg_tx);

    chan.send(run_request(0)).await.expect("send run");

    let envelope = next_envelope(&mut msg_rx).await;
    assert_eq!(
        envelope.message.as_progress().expect("unit 1 heartbeat").current,
        1
    );

    let envelope = next_envelope(&mut msg_rx).await;
    match envelope.message {
        ChannelMessage::Error { message } => {
            assert!(message.contains("unit 2"), "got message: {message}");
        }
        other => panic!("expected Error, got {other:?}"),
    }
    chan.close().await;
}

#[tokio::test(start_paused = true)]
async fn terminate_suppresses_completion_messages() {
    let (msg_tx, mut msg_rx) = mpsc::channel(32);
    let workload = Arc::new(SimWorkload::new("core", 100, Duration::from_secs(1)));
    let chan = ExecutionChannel::open(Tier::Core, 9, workload, msg_tx);

    chan.send(run_request(0)).await.expect("send run");
    let envelope = next_envelope(&mut msg_rx).await;
    assert!(envelope.message.as_progress().is_some());

    chan.terminate();
    chan.terminate();

    // Neither Done nor Error may follow a terminate; the task just
    // drops its sender.
    let result = timeout(Duration::from_secs(30), msg_rx.recv()).await;
    assert!(
        matches!(result, Ok(None)),
        "expected the stream to close quietly, got {result:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_request_closes_the_channel() {
    let (msg_tx, mut msg_rx) = mpsc::channel(32);
    let workload = Arc::new(SimWorkload::new("core", 3, Duration::from_secs(1)));
    let chan = ExecutionChannel::open(Tier::Core, 1, workload, msg_tx);

    chan.send(ChannelRequest::Cancel).await.expect("send cancel");
    tokio::time::sleep(Duration::from_millis(10)).await;

    // The task exited without running anything.
    assert!(matches!(
        timeout(Duration::from_secs(5), msg_rx.recv()).await,
        Ok(None)
    ));
    assert!(chan.send(run_request(0)).await.is_err());
}
