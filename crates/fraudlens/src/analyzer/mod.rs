//! The pluggable analyzer contract.
//!
//! An analyzer turns one file into an [`AnalysisResult`] or an
//! [`AnalysisError`]. Scores must lie in [0, 100]; the orchestrator validates
//! every result and turns violations into `internal-error` failures.

pub mod simulated;

use async_trait::async_trait;

use crate::job::{AnalysisError, AnalysisRequest, AnalysisResult, Description};

pub use simulated::SimulatedAnalyzer;

/// Everything an analyzer receives for one file.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    pub request: &'a AnalysisRequest,
    /// Description shared by the whole batch.
    pub description: &'a Description,
    /// Submission position of the file inside its batch.
    pub sequence: usize,
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, input: AnalysisInput<'_>) -> Result<AnalysisResult, AnalysisError>;
}
