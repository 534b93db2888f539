//! Snapshot broadcaster for async consumers.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::orchestrator::BatchSnapshot;

/// Fans published snapshots out to any number of async receivers.
///
/// Slow receivers that fall more than `capacity` snapshots behind see
/// `RecvError::Lagged`; since every snapshot is complete, skipping ahead loses
/// nothing but intermediate states.
#[derive(Clone)]
pub struct SnapshotBroadcaster {
    sender: Arc<broadcast::Sender<Arc<BatchSnapshot>>>,
}

impl SnapshotBroadcaster {
    /// Creates a new broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends a snapshot to all subscribers.
    pub fn send(&self, snapshot: Arc<BatchSnapshot>) {
        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(snapshot);
    }

    /// Creates a new subscriber for snapshots.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<BatchSnapshot>> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SnapshotBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
