//! Per-file analysis state machine.
//!
//! `Queued -> Running -> {Succeeded, Failed}`, plus `Queued -> Failed` when a
//! job is cancelled before it ever started. Terminal jobs never change again;
//! a retry is a new job that links back to the attempt it replaces.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::job::request::AnalysisRequest;
use crate::job::result::{AnalysisError, AnalysisResult};

/// Discriminant of [`JobStatus`], used for filtering and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Queued => write!(f, "Queued"),
            JobState::Running => write!(f, "Running"),
            JobState::Succeeded => write!(f, "Succeeded"),
            JobState::Failed => write!(f, "Failed"),
        }
    }
}

/// Current status of a job together with the data that state owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running {
        started_at: DateTime<Utc>,
    },
    Succeeded {
        result: Arc<AnalysisResult>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    Failed {
        error: AnalysisError,
        #[serde(skip_serializing_if = "Option::is_none")]
        started_at: Option<DateTime<Utc>>,
        failed_at: DateTime<Utc>,
    },
}

impl JobStatus {
    pub fn state(&self) -> JobState {
        match self {
            JobStatus::Queued => JobState::Queued,
            JobStatus::Running { .. } => JobState::Running,
            JobStatus::Succeeded { .. } => JobState::Succeeded,
            JobStatus::Failed { .. } => JobState::Failed,
        }
    }
}

/// Tracks one request from submission to completion or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisJob {
    pub id: String,
    /// Submission position inside the batch; listings are ordered by it.
    pub sequence: usize,
    pub request: Arc<AnalysisRequest>,
    pub status: JobStatus,
    /// Id of the failed attempt this job replaces.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_of: Option<String>,
}

impl AnalysisJob {
    /// Creates a queued job for a request.
    pub fn new(sequence: usize, request: Arc<AnalysisRequest>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sequence,
            request,
            status: JobStatus::Queued,
            retry_of: None,
        }
    }

    pub fn state(&self) -> JobState {
        self.status.state()
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.status {
            JobStatus::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        match &self.status {
            JobStatus::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match &self.status {
            JobStatus::Queued => None,
            JobStatus::Running { started_at } | JobStatus::Succeeded { started_at, .. } => {
                Some(*started_at)
            }
            JobStatus::Failed { started_at, .. } => *started_at,
        }
    }

    /// `Queued -> Running`.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.ensure_not_terminal()?;
        if self.state() != JobState::Queued {
            return Err(self.unexpected(JobState::Queued));
        }
        self.status = JobStatus::Running {
            started_at: Utc::now(),
        };
        Ok(())
    }

    /// `Running -> Succeeded`, or `Running -> Failed(internal-error)` when the
    /// result breaks the analyzer contract.
    pub fn succeed(&mut self, result: AnalysisResult) -> Result<(), TransitionError> {
        self.ensure_not_terminal()?;
        let started_at = match self.status {
            JobStatus::Running { started_at } => started_at,
            _ => return Err(self.unexpected(JobState::Running)),
        };

        if let Err(violation) = result.validate() {
            self.status = JobStatus::Failed {
                error: violation,
                started_at: Some(started_at),
                failed_at: Utc::now(),
            };
            return Ok(());
        }

        self.status = JobStatus::Succeeded {
            result: Arc::new(result),
            started_at,
            completed_at: Utc::now(),
        };
        Ok(())
    }

    /// `{Queued, Running} -> Failed`.
    pub fn fail(&mut self, error: AnalysisError) -> Result<(), TransitionError> {
        self.ensure_not_terminal()?;
        self.status = JobStatus::Failed {
            error,
            started_at: self.started_at(),
            failed_at: Utc::now(),
        };
        Ok(())
    }

    /// Builds the replacement for a failed job: same request and slot, new id.
    pub fn retry(&self) -> Result<AnalysisJob, TransitionError> {
        if self.state() != JobState::Failed {
            return Err(self.unexpected(JobState::Failed));
        }
        let mut job = AnalysisJob::new(self.sequence, Arc::clone(&self.request));
        job.retry_of = Some(self.id.clone());
        Ok(job)
    }

    fn ensure_not_terminal(&self) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal {
                job_id: self.id.clone(),
                state: self.state(),
            });
        }
        Ok(())
    }

    fn unexpected(&self, expected: JobState) -> TransitionError {
        TransitionError::UnexpectedState {
            job_id: self.id.clone(),
            state: self.state(),
            expected,
        }
    }
}
