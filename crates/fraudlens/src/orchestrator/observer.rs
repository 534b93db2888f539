//! Callback observers notified with every published snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::orchestrator::BatchSnapshot;

/// Receives each snapshot the orchestrator publishes, in publication order.
///
/// Observers run synchronously on the thread that applied the transition.
/// They may read [`crate::AnalysisOrchestrator::current_snapshot`] but must not
/// submit, cancel, clear or retry from inside the callback.
pub trait SnapshotObserver: Send + Sync {
    fn on_snapshot(&self, snapshot: &Arc<BatchSnapshot>);
}

impl<F> SnapshotObserver for F
where
    F: Fn(&Arc<BatchSnapshot>) + Send + Sync,
{
    fn on_snapshot(&self, snapshot: &Arc<BatchSnapshot>) {
        self(snapshot)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Entry = (SubscriptionId, Arc<dyn SnapshotObserver>);

#[derive(Default)]
pub(crate) struct ObserverRegistry {
    next_id: AtomicU64,
    observers: Mutex<Vec<Entry>>,
}

impl ObserverRegistry {
    fn entries(&self) -> std::sync::MutexGuard<'_, Vec<Entry>> {
        match self.observers.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Observer registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    pub(crate) fn add(&self, observer: Arc<dyn SnapshotObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries().push((id, observer));
        id
    }

    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries().len()
    }

    pub(crate) fn notify(&self, snapshot: &Arc<BatchSnapshot>) {
        // Copy out so observers can unsubscribe from inside the callback
        let observers: Vec<Arc<dyn SnapshotObserver>> =
            self.entries().iter().map(|(_, o)| Arc::clone(o)).collect();
        for observer in observers {
            observer.on_snapshot(snapshot);
        }
    }
}
