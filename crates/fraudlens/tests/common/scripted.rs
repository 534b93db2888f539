//! Fake analyzer driven entirely by the test.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::oneshot;

use fraudlens::analyzer::{AnalysisInput, Analyzer};
use fraudlens::{AnalysisError, AnalysisResult, BatchSnapshot, Metadata};

pub fn result(duplicate: f64, manipulation: f64, clip: f64) -> AnalysisResult {
    AnalysisResult {
        duplicate_score: duplicate,
        manipulation_score: manipulation,
        clip_similarity: clip,
        metadata: Metadata {
            exif_stripped: false,
            dimensions: Some("640x480".to_string()),
            file_size_label: "0.1 MB".to_string(),
            completed_at: Utc::now(),
        },
    }
}

/// Outcomes are queued per file name and consumed one per call. Files with
/// nothing queued succeed with `result(10, 20, 90)`.
#[derive(Default)]
pub struct ScriptedAnalyzer {
    outcomes: Mutex<HashMap<String, VecDeque<Result<AnalysisResult, AnalysisError>>>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    started: Mutex<Vec<String>>,
    finished: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedAnalyzer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, name: &str, outcome: Result<AnalysisResult, AnalysisError>) {
        self.outcomes
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push_back(outcome);
    }

    /// Holds the next call for `name` until the returned sender fires or is dropped.
    pub fn hold(&self, name: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(name.to_string(), rx);
        tx
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub async fn wait_for_started(&self, count: usize) {
        wait_until(|| self.started.lock().unwrap().len() >= count).await;
    }

    pub async fn wait_for_finished(&self, count: usize) {
        wait_until(|| self.finished.lock().unwrap().len() >= count).await;
    }
}

#[async_trait]
impl Analyzer for ScriptedAnalyzer {
    async fn analyze(&self, input: AnalysisInput<'_>) -> Result<AnalysisResult, AnalysisError> {
        let name = input.request.display_name.clone();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.started.lock().unwrap().push(name.clone());

        let gate = self.gates.lock().unwrap().remove(&name);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .get_mut(&name)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Ok(result(10.0, 20.0, 90.0)));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.finished.lock().unwrap().push(name);
        outcome
    }
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Records every snapshot delivered to a callback observer.
#[derive(Clone, Default)]
pub struct SnapshotLog {
    snapshots: Arc<Mutex<Vec<Arc<BatchSnapshot>>>>,
}

impl SnapshotLog {
    pub fn observer(&self) -> impl Fn(&Arc<BatchSnapshot>) + Send + Sync + 'static {
        let snapshots = Arc::clone(&self.snapshots);
        move |snapshot: &Arc<BatchSnapshot>| snapshots.lock().unwrap().push(Arc::clone(snapshot))
    }

    pub fn snapshots(&self) -> Vec<Arc<BatchSnapshot>> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }
}
