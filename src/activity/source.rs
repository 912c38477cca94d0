//! Activity signal source.

use tokio::sync::watch;

/// Fan-out point for host activity notifications.
///
/// The host environment wires its real input events to
/// [`notify_activity`](Self::notify_activity); every subscribed
/// [`ActivityMonitor`](super::ActivityMonitor) observes every tick
/// independently. Cloning shares the same underlying signal.
#[derive(Debug, Clone)]
pub struct ActivitySource {
    tx: watch::Sender<u64>,
}

impl ActivitySource {
    /// Create a new source with no recorded activity.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    /// Record one activity notification.
    pub fn notify_activity(&self) {
        self.tx.send_modify(|n| *n = n.wrapping_add(1));
    }

    /// Subscribe to activity ticks.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}

impl Default for ActivitySource {
    fn default() -> Self {
        Self::new()
    }
}
