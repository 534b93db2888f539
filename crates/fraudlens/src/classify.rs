//! Threat tiers derived from continuous 0-100 scores.
//!
//! Every dimension is read as "higher means riskier" except image/text
//! consistency, where a high similarity is good. [`consistency_risk`] is the
//! single place that inversion happens.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default lower bound of the Medium tier.
pub const DEFAULT_MEDIUM_THRESHOLD: f64 = 30.0;
/// Default lower bound of the High tier.
pub const DEFAULT_HIGH_THRESHOLD: f64 = 70.0;

/// Discrete threat tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tier boundaries: `score < medium` is Low, `score >= high` is High.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierThresholds {
    pub medium: f64,
    pub high: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            medium: DEFAULT_MEDIUM_THRESHOLD,
            high: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

/// Classifies with the default 30/70 thresholds.
pub fn classify(score: f64) -> RiskTier {
    classify_with(score, &TierThresholds::default())
}

/// Classifies against explicit thresholds.
///
/// Total over `f64`: callers clamp or validate first if out-of-range input is
/// possible. NaN fails both comparisons and lands on High.
pub fn classify_with(score: f64, thresholds: &TierThresholds) -> RiskTier {
    if score < thresholds.medium {
        RiskTier::Low
    } else if score < thresholds.high {
        RiskTier::Medium
    } else {
        RiskTier::High
    }
}

/// Risk reading of a consistency score.
pub fn consistency_risk(clip_similarity: f64) -> f64 {
    100.0 - clip_similarity
}

/// Tier of a consistency score, after inversion.
pub fn classify_consistency(clip_similarity: f64, thresholds: &TierThresholds) -> RiskTier {
    classify_with(consistency_risk(clip_similarity), thresholds)
}
