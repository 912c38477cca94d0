//! Single-shot idle-deadline timer with pure debounce semantics.
//!
//! Each monitor owns one deadline; every activity notification
//! reschedules it to fire `threshold` after the *last* notification.
//! The callback fires at most once, after which the task exits. Two
//! independent monitors may be active simultaneously without sharing
//! timer state.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};

/// Debounced idle timer over an activity subscription.
pub struct ActivityMonitor;

impl ActivityMonitor {
    /// Start a monitor that calls `on_fire` once after `threshold` of
    /// silence on `activity`.
    ///
    /// Returns a handle whose [`cancel`](ActivityMonitorHandle::cancel)
    /// stops the timer and detaches from the activity source. Dropping
    /// the handle also cancels. There are no error conditions: failure
    /// to fire is only possible after a cancel.
    #[must_use]
    pub fn start<F>(
        mut activity: watch::Receiver<u64>,
        threshold: Duration,
        on_fire: F,
    ) -> ActivityMonitorHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let cancel_for_task = cancel.clone();

        // Ticks recorded before start don't count as fresh activity.
        activity.mark_unchanged();

        let task = tokio::spawn(
            async move {
                let mut detached = false;
                loop {
                    tokio::select! {
                        () = cancel_for_task.cancelled() => {
                            debug!("activity monitor cancelled");
                            return;
                        }
                        changed = activity.changed(), if !detached => {
                            match changed {
                                // Activity observed: restart the deadline.
                                Ok(()) => continue,
                                // Source dropped: fall back to a plain deadline.
                                Err(_) => {
                                    detached = true;
                                    continue;
                                }
                            }
                        }
                        () = tokio::time::sleep(threshold) => {
                            debug!(?threshold, "idle deadline fired");
                            on_fire();
                            return;
                        }
                    }
                }
            }
            .instrument(info_span!("activity_monitor")),
        );

        ActivityMonitorHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Handle controlling a started [`ActivityMonitor`].
pub struct ActivityMonitorHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ActivityMonitorHandle {
    /// Stop the timer and detach from the activity source. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the monitor has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Await the timer task's exit (after fire or cancel).
    pub async fn await_completion(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ActivityMonitorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
