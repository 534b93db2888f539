//! Batch orchestration.
//!
//! An [`AnalysisOrchestrator`] owns the current batch, feeds its files to an
//! [`Analyzer`] with bounded concurrency, and publishes a fresh immutable
//! [`BatchSnapshot`] after every state transition. All transitions and
//! publications happen under one lock, so every consumer observes them in
//! the same order.

pub mod config;
mod dispatch;
pub mod observer;
pub mod snapshot;

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::Utc;
use log::{debug, info, warn};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, Semaphore};

use crate::analyzer::Analyzer;
use crate::broadcast::SnapshotBroadcaster;
use crate::error::OrchestratorError;
use crate::job::{AnalysisError, AnalysisJob, AnalysisRequest, Description};
use crate::metrics::{summarize_with, BatchSummary};

pub use config::OrchestratorConfig;
pub use observer::{SnapshotObserver, SubscriptionId};
pub use snapshot::BatchSnapshot;

use observer::ObserverRegistry;

pub(crate) struct Batch {
    pub(crate) id: String,
    pub(crate) description: Description,
    pub(crate) jobs: Vec<AnalysisJob>,
    pub(crate) cancelled: bool,
    pub(crate) dispatcher_active: bool,
    /// Failed jobs replaced by a retry, oldest first.
    pub(crate) superseded: Vec<AnalysisJob>,
}

impl Batch {
    fn new(description: Description, jobs: Vec<AnalysisJob>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            description,
            jobs,
            cancelled: false,
            dispatcher_active: false,
            superseded: Vec::new(),
        }
    }
}

pub(crate) struct State {
    pub(crate) batch: Batch,
    revision: u64,
}

pub(crate) struct Shared {
    pub(crate) config: OrchestratorConfig,
    pub(crate) analyzer: Arc<dyn Analyzer>,
    pub(crate) permits: Arc<Semaphore>,
    pub(crate) runtime: Handle,
    state: Mutex<State>,
    current: RwLock<Arc<BatchSnapshot>>,
    broadcaster: SnapshotBroadcaster,
    observers: ObserverRegistry,
}

impl Shared {
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                warn!("Orchestrator state lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn current(&self) -> Arc<BatchSnapshot> {
        match self.current.read() {
            Ok(g) => Arc::clone(&g),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Builds, stores and delivers the next snapshot.
    ///
    /// Must be called with the state lock held so publication order matches
    /// transition order.
    pub(crate) fn publish(&self, state: &mut State) -> Arc<BatchSnapshot> {
        state.revision += 1;
        let snapshot = Arc::new(BatchSnapshot {
            batch_id: state.batch.id.clone(),
            revision: state.revision,
            description: state.batch.description.clone(),
            jobs: state.batch.jobs.clone(),
            published_at: Utc::now(),
        });

        {
            let mut current = match self.current.write() {
                Ok(g) => g,
                Err(poisoned) => poisoned.into_inner(),
            };
            *current = Arc::clone(&snapshot);
        }

        self.broadcaster.send(Arc::clone(&snapshot));
        self.observers.notify(&snapshot);
        snapshot
    }

    /// Fails every non-terminal job of the current batch as cancelled.
    fn cancel_locked(&self, state: &mut State) -> bool {
        state.batch.cancelled = true;
        let mut changed = 0;
        for job in state.batch.jobs.iter_mut().filter(|j| !j.is_terminal()) {
            if job.fail(AnalysisError::cancelled()).is_ok() {
                changed += 1;
            }
        }
        if changed > 0 {
            info!("Cancelled {} job(s) of batch {}", changed, state.batch.id);
            self.publish(state);
        }
        changed > 0
    }
}

/// Runs batches of image analyses and publishes their progress.
///
/// Cloning yields another handle to the same orchestrator.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    shared: Arc<Shared>,
}

impl AnalysisOrchestrator {
    /// Creates an orchestrator bound to the ambient tokio runtime.
    pub fn new(
        analyzer: Arc<dyn Analyzer>,
        config: OrchestratorConfig,
    ) -> Result<Self, OrchestratorError> {
        let runtime = Handle::try_current().map_err(|_| OrchestratorError::NoRuntime)?;
        Ok(Self::with_runtime(analyzer, config, runtime))
    }

    pub fn with_runtime(
        analyzer: Arc<dyn Analyzer>,
        config: OrchestratorConfig,
        runtime: Handle,
    ) -> Self {
        let max_concurrent = config.max_concurrent_analyses.max(1);
        let initial = Arc::new(BatchSnapshot::empty());
        let state = State {
            batch: Batch {
                id: initial.batch_id.clone(),
                ..Batch::new(Description::default(), Vec::new())
            },
            revision: initial.revision,
        };

        info!(
            "Orchestrator ready with {} concurrent analyses, timeout {:?}",
            max_concurrent, config.analyzer_timeout
        );

        Self {
            shared: Arc::new(Shared {
                permits: Arc::new(Semaphore::new(max_concurrent)),
                broadcaster: SnapshotBroadcaster::new(config.broadcast_capacity),
                config,
                analyzer,
                runtime,
                state: Mutex::new(state),
                current: RwLock::new(initial),
                observers: ObserverRegistry::default(),
            }),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.shared.config
    }

    /// Replaces the current batch with a new one built from `requests`.
    ///
    /// Unfinished jobs of the previous batch are failed as cancelled first,
    /// and their results are discarded if they arrive later. Returns the
    /// initial snapshot of the new batch, with every job queued.
    pub fn submit_batch<I>(&self, requests: I, description: Description) -> Arc<BatchSnapshot>
    where
        I: IntoIterator<Item = AnalysisRequest>,
    {
        let jobs: Vec<AnalysisJob> = requests
            .into_iter()
            .enumerate()
            .map(|(sequence, request)| AnalysisJob::new(sequence, Arc::new(request)))
            .collect();

        let mut state = self.shared.lock_state();
        self.shared.cancel_locked(&mut state);

        let spawn_dispatcher = !jobs.is_empty();
        state.batch = Batch::new(description, jobs);
        state.batch.dispatcher_active = spawn_dispatcher;
        let snapshot = self.shared.publish(&mut state);
        drop(state);

        info!(
            "Submitted batch {} with {} file(s)",
            snapshot.batch_id,
            snapshot.len()
        );
        if spawn_dispatcher {
            self.spawn_dispatcher(snapshot.batch_id.clone());
        }
        snapshot
    }

    /// Latest published snapshot. Never blocks on running analyses.
    pub fn current_snapshot(&self) -> Arc<BatchSnapshot> {
        self.shared.current()
    }

    /// Summary of the latest snapshot, using the configured weights.
    pub fn summary(&self) -> BatchSummary {
        summarize_with(&self.current_snapshot(), &self.shared.config.weights)
    }

    /// Fails every queued or running job of the current batch as cancelled.
    ///
    /// Already-terminal jobs keep their outcome. Returns the resulting snapshot.
    pub fn cancel_batch(&self) -> Arc<BatchSnapshot> {
        let mut state = self.shared.lock_state();
        if !self.shared.cancel_locked(&mut state) {
            debug!("Nothing to cancel in batch {}", state.batch.id);
        }
        drop(state);
        self.current_snapshot()
    }

    /// Cancels outstanding work and installs an empty batch.
    pub fn clear_batch(&self) -> Arc<BatchSnapshot> {
        self.submit_batch(Vec::<AnalysisRequest>::new(), Description::default())
    }

    /// Queues a fresh attempt for a failed job of the current batch.
    ///
    /// The new job takes the failed job's position; the failed job moves to
    /// [`superseded_jobs`](Self::superseded_jobs).
    pub fn retry_job(&self, job_id: &str) -> Result<Arc<BatchSnapshot>, OrchestratorError> {
        let mut state = self.shared.lock_state();
        let index = state
            .batch
            .jobs
            .iter()
            .position(|j| j.id == job_id)
            .ok_or_else(|| OrchestratorError::UnknownJob(job_id.to_string()))?;

        let replacement = state.batch.jobs[index].retry()?;
        debug!("Retrying job {} as {}", job_id, replacement.id);
        let failed = std::mem::replace(&mut state.batch.jobs[index], replacement);
        state.batch.superseded.push(failed);
        state.batch.cancelled = false;

        let snapshot = self.shared.publish(&mut state);
        let spawn_dispatcher = !state.batch.dispatcher_active;
        state.batch.dispatcher_active = true;
        drop(state);

        if spawn_dispatcher {
            self.spawn_dispatcher(snapshot.batch_id.clone());
        }
        Ok(snapshot)
    }

    /// Failed jobs of the current batch that were replaced by a retry.
    pub fn superseded_jobs(&self) -> Vec<AnalysisJob> {
        self.shared.lock_state().batch.superseded.clone()
    }

    /// Registers a callback invoked with every snapshot published from now on.
    pub fn subscribe<O>(&self, observer: O) -> SubscriptionId
    where
        O: SnapshotObserver + 'static,
    {
        self.shared.observers.add(Arc::new(observer))
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.observers.remove(id)
    }

    /// Channel receiving every snapshot published from now on.
    ///
    /// Slow receivers may lag; [`current_snapshot`](Self::current_snapshot)
    /// always has the latest state.
    pub fn watch(&self) -> broadcast::Receiver<Arc<BatchSnapshot>> {
        self.shared.broadcaster.subscribe()
    }

    /// Resolves once the current batch has no queued or running job.
    pub async fn wait_until_settled(&self) -> Arc<BatchSnapshot> {
        let mut receiver = self.watch();
        let mut snapshot = self.current_snapshot();
        while !snapshot.is_settled() {
            match receiver.recv().await {
                Ok(next) if next.revision > snapshot.revision => snapshot = next,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("Settle watcher lagged by {} snapshot(s)", skipped);
                    snapshot = self.current_snapshot();
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        snapshot
    }

    fn spawn_dispatcher(&self, batch_id: String) {
        self.shared
            .runtime
            .spawn(dispatch::run_dispatcher(Arc::clone(&self.shared), batch_id));
    }
}
