//! Fraud screening core for submitted images.
//!
//! Files are wrapped in [`AnalysisJob`]s, scored by a pluggable [`Analyzer`]
//! under an [`AnalysisOrchestrator`], and read back as immutable
//! [`BatchSnapshot`]s that feed [`metrics::summarize`] and the tiering in
//! [`classify`] and [`assessment`].

pub mod analyzer;
pub mod assessment;
pub mod broadcast;
pub mod classify;
pub mod config;
pub mod error;
pub mod job;
pub mod metrics;
pub mod orchestrator;
pub mod telemetry;

pub use analyzer::{AnalysisInput, Analyzer, SimulatedAnalyzer};
pub use assessment::{BatchAssessment, ImageAssessment, JobAssessment};
pub use broadcast::SnapshotBroadcaster;
pub use classify::{classify, classify_with, RiskTier, TierThresholds};
pub use config::{load_config, load_config_from_str, Config};
pub use error::{
    ConfigError, FraudlensError, OrchestratorError, Result, TransitionError, UploadError,
};
pub use job::{
    AnalysisError, AnalysisJob, AnalysisRequest, AnalysisResult, Description, ErrorKind,
    JobState, JobStatus, Metadata, UploadPolicy,
};
pub use metrics::{summarize, summarize_with, BatchSummary, RiskWeights};
pub use orchestrator::{
    AnalysisOrchestrator, BatchSnapshot, OrchestratorConfig, SnapshotObserver, SubscriptionId,
};
pub use telemetry::{init_logging, LogFormat};
