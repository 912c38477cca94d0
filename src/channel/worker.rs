//! Task-isolated execution channel.
//!
//! An [`ExecutionChannel`] runs one tier workload inside its own tokio
//! task. The caller submits a [`ChannelRequest`] and receives an
//! asynchronous stream of [`ChannelMessage`]s over an mpsc channel;
//! [`terminate`](ExecutionChannel::terminate) forcibly ends the unit of
//! work and is safe to call repeatedly or after completion.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

use crate::models::{RunOutcome, Tier};
use crate::{AppError, Result};

use super::protocol::{ChannelEnvelope, ChannelMessage, ChannelRequest, RunRequest};

/// Progress sink handed to a running workload.
///
/// Reports flow back to the scheduler as epoch-tagged
/// [`ChannelMessage::Progress`] heartbeats.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tier: Tier,
    epoch: u64,
    tx: mpsc::Sender<ChannelEnvelope>,
}

impl ProgressReporter {
    /// Report a completed unit of work.
    pub async fn report(&self, current: u64, total: u64, label: &str, eta_ms: Option<u64>) {
        let envelope = ChannelEnvelope {
            tier: self.tier,
            epoch: self.epoch,
            message: ChannelMessage::Progress {
                current,
                total,
                label: label.to_owned(),
                eta_ms,
            },
        };
        // A closed stream means the channel was terminated; the workload
        // is about to be dropped anyway.
        let _ = self.tx.send(envelope).await;
    }
}

/// One isolated run attempt of a tier workload.
///
/// Implementations communicate only through the [`ProgressReporter`]
/// and their return value, which keeps them substitutable by threads,
/// OS processes, or actor mailboxes.
pub trait TierWorkload: Send + Sync {
    /// Execute one run attempt.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Channel`] if the unit of work fails; the
    /// message is surfaced verbatim as a [`ChannelMessage::Error`].
    fn execute(
        &self,
        request: RunRequest,
        progress: ProgressReporter,
    ) -> Pin<Box<dyn Future<Output = Result<RunOutcome>> + Send + '_>>;
}

/// The cheap, synchronous smoke tier.
///
/// Runs in-process and never suspends; always produces an outcome
/// immediately.
pub trait SmokeSuite: Send + Sync {
    /// Execute the smoke tier.
    fn run(&self) -> RunOutcome;
}

/// Handle over an isolated unit of work.
pub struct ExecutionChannel {
    tier: Tier,
    epoch: u64,
    req_tx: mpsc::Sender<ChannelRequest>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ExecutionChannel {
    /// Open a channel around a workload.
    ///
    /// The spawned task waits for a [`ChannelRequest::Run`], executes
    /// the workload, and emits exactly one `Done` or `Error` envelope —
    /// unless terminated first, in which case neither fires.
    #[must_use]
    pub fn open(
        tier: Tier,
        epoch: u64,
        workload: Arc<dyn TierWorkload>,
        msg_tx: mpsc::Sender<ChannelEnvelope>,
    ) -> Self {
        let (req_tx, mut req_rx) = mpsc::channel::<ChannelRequest>(4);
        let cancel = CancellationToken::new();
        let cancel_for_task = cancel.clone();

        let task = tokio::spawn(
            async move {
                loop {
                    let request = tokio::select! {
                        () = cancel_for_task.cancelled() => {
                            debug!(%tier, epoch, "channel terminated while idle");
                            return;
                        }
                        req = req_rx.recv() => match req {
                            Some(ChannelRequest::Run(request)) => request,
                            Some(ChannelRequest::Cancel) | None => {
                                debug!(%tier, epoch, "channel closed without a run");
                                return;
                            }
                        },
                    };

                    let reporter = ProgressReporter {
                        tier,
                        epoch,
                        tx: msg_tx.clone(),
                    };

                    let result = tokio::select! {
                        () = cancel_for_task.cancelled() => {
                            // Terminate preempts the run: neither Done nor
                            // Error is delivered.
                            debug!(%tier, epoch, "channel terminated mid-run");
                            return;
                        }
                        result = workload.execute(request, reporter) => result,
                    };

                    let message = match result {
                        Ok(outcome) => ChannelMessage::done(outcome),
                        Err(err) => {
                            warn!(%tier, epoch, %err, "workload reported an error");
                            ChannelMessage::Error {
                                message: err.to_string(),
                            }
                        }
                    };

                    let envelope = ChannelEnvelope {
                        tier,
                        epoch,
                        message,
                    };
                    if msg_tx.send(envelope).await.is_err() {
                        return;
                    }
                }
            }
            .instrument(info_span!("execution_channel")),
        );

        Self {
            tier,
            epoch,
            req_tx,
            cancel,
            task: Some(task),
        }
    }

    /// Submit a request to the unit of work.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Channel`] if the channel task has ended.
    pub async fn send(&self, request: ChannelRequest) -> Result<()> {
        self.req_tx
            .send(request)
            .await
            .map_err(|_| AppError::Channel(format!("{} channel is closed", self.tier)))
    }

    /// Forcibly end the unit of work.
    ///
    /// Idempotent: safe to call multiple times or after completion.
    pub fn terminate(&self) {
        self.cancel.cancel();
    }

    /// Tier this channel runs.
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Generation counter assigned at open.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Terminate and await the channel task's exit.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ExecutionChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
