use serde::{Deserialize, Serialize};

use crate::classify::TierThresholds;
use crate::metrics::RiskWeights;

/// Upload size limit applied by the default [`crate::job::UploadPolicy`] (10 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub version: String,
    #[serde(default = "default_max_concurrent_analyses")]
    pub max_concurrent_analyses: usize,
    #[serde(default = "default_analyzer_timeout_ms")]
    pub analyzer_timeout_ms: u64,
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
    #[serde(default)]
    pub thresholds: TierThresholds,
    #[serde(default)]
    pub weights: RiskWeights,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

fn default_max_concurrent_analyses() -> usize {
    num_cpus::get()
}

fn default_analyzer_timeout_ms() -> u64 {
    30_000
}

fn default_broadcast_capacity() -> usize {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            max_concurrent_analyses: default_max_concurrent_analyses(),
            analyzer_timeout_ms: default_analyzer_timeout_ms(),
            broadcast_capacity: default_broadcast_capacity(),
            thresholds: TierThresholds::default(),
            weights: RiskWeights::default(),
            simulation: SimulationConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

/// Settings for the placeholder analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    #[serde(default = "default_base_latency_ms")]
    pub base_latency_ms: u64,
    /// Extra delay per submission position, so results arrive staggered.
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
    /// Fixed seed for reproducible scores.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_base_latency_ms() -> u64 {
    2000
}

fn default_stagger_ms() -> u64 {
    1000
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            base_latency_ms: default_base_latency_ms(),
            stagger_ms: default_stagger_ms(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}
