use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::job::{AnalysisJob, Description, JobState};

/// Immutable point-in-time view of every job in a batch, in submission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSnapshot {
    pub batch_id: String,
    /// Publication counter; strictly increases across the orchestrator's lifetime.
    pub revision: u64,
    pub description: Description,
    pub jobs: Vec<AnalysisJob>,
    pub published_at: DateTime<Utc>,
}

impl BatchSnapshot {
    /// Snapshot of a batch with no files.
    pub fn empty() -> Self {
        Self {
            batch_id: uuid::Uuid::new_v4().to_string(),
            revision: 0,
            description: Description::default(),
            jobs: Vec::new(),
            published_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn job(&self, job_id: &str) -> Option<&AnalysisJob> {
        self.jobs.iter().find(|j| j.id == job_id)
    }

    pub fn count(&self, state: JobState) -> usize {
        self.jobs.iter().filter(|j| j.state() == state).count()
    }

    /// True once every job has reached a terminal state.
    pub fn is_settled(&self) -> bool {
        self.jobs.iter().all(|j| j.is_terminal())
    }
}

impl Default for BatchSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
