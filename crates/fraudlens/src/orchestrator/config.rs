use std::time::Duration;

use crate::classify::TierThresholds;
use crate::config::Config;
use crate::metrics::RiskWeights;

/// Runtime settings of an [`crate::AnalysisOrchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on analyzer calls in flight, across batches.
    pub max_concurrent_analyses: usize,
    pub analyzer_timeout: Duration,
    pub broadcast_capacity: usize,
    pub thresholds: TierThresholds,
    pub weights: RiskWeights,
}

impl OrchestratorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_concurrent_analyses: config.max_concurrent_analyses,
            analyzer_timeout: Duration::from_millis(config.analyzer_timeout_ms),
            broadcast_capacity: config.broadcast_capacity,
            thresholds: config.thresholds,
            weights: config.weights,
        }
    }

    pub fn with_max_concurrent_analyses(mut self, max: usize) -> Self {
        self.max_concurrent_analyses = max;
        self
    }

    pub fn with_analyzer_timeout(mut self, timeout: Duration) -> Self {
        self.analyzer_timeout = timeout;
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
