//! Batch-level summary statistics.
//!
//! [`summarize`] is a pure function of a snapshot: nothing is cached between
//! calls, so a summary can never drift from the snapshot it was built from.

use serde::{Deserialize, Serialize};

use crate::classify::{classify_with, consistency_risk, RiskTier, TierThresholds};
use crate::job::JobState;
use crate::orchestrator::BatchSnapshot;

/// Weights of the overall risk blend. Expected to sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskWeights {
    pub duplicate: f64,
    pub manipulation: f64,
    /// Applied to the inverted consistency score.
    pub consistency: f64,
}

impl RiskWeights {
    pub fn sum(&self) -> f64 {
        self.duplicate + self.manipulation + self.consistency
    }
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            duplicate: 0.4,
            manipulation: 0.4,
            consistency: 0.2,
        }
    }
}

/// Aggregate view of one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_count: usize,
    pub completed_count: usize,
    pub failed_count: usize,
    pub queued_count: usize,
    pub running_count: usize,
    /// Means over succeeded jobs only; 0 when `completed_count` is 0.
    pub mean_duplicate: f64,
    pub mean_manipulation: f64,
    pub mean_clip: f64,
    /// 0 when `completed_count` is 0.
    pub overall_risk: f64,
}

impl BatchSummary {
    /// True when no job is queued or running.
    pub fn is_settled(&self) -> bool {
        self.queued_count == 0 && self.running_count == 0
    }

    /// Fraction of jobs that reached a terminal state, in [0, 1].
    pub fn progress(&self) -> f64 {
        if self.total_count == 0 {
            return 1.0;
        }
        (self.completed_count + self.failed_count) as f64 / self.total_count as f64
    }

    /// Tier of the overall risk, or `None` while nothing has succeeded.
    pub fn risk_tier(&self, thresholds: &TierThresholds) -> Option<RiskTier> {
        if self.completed_count == 0 {
            return None;
        }
        Some(classify_with(self.overall_risk, thresholds))
    }
}

/// Summarizes with the default 0.4/0.4/0.2 weights.
pub fn summarize(snapshot: &BatchSnapshot) -> BatchSummary {
    summarize_with(snapshot, &RiskWeights::default())
}

pub fn summarize_with(snapshot: &BatchSnapshot, weights: &RiskWeights) -> BatchSummary {
    let mut summary = BatchSummary {
        total_count: snapshot.len(),
        completed_count: 0,
        failed_count: 0,
        queued_count: 0,
        running_count: 0,
        mean_duplicate: 0.0,
        mean_manipulation: 0.0,
        mean_clip: 0.0,
        overall_risk: 0.0,
    };

    let (mut duplicate, mut manipulation, mut clip) = (0.0, 0.0, 0.0);
    for job in &snapshot.jobs {
        match job.state() {
            JobState::Queued => summary.queued_count += 1,
            JobState::Running => summary.running_count += 1,
            JobState::Failed => summary.failed_count += 1,
            JobState::Succeeded => {
                if let Some(result) = job.result() {
                    summary.completed_count += 1;
                    duplicate += result.duplicate_score;
                    manipulation += result.manipulation_score;
                    clip += result.clip_similarity;
                }
            }
        }
    }

    if summary.completed_count == 0 {
        return summary;
    }

    let n = summary.completed_count as f64;
    summary.mean_duplicate = duplicate / n;
    summary.mean_manipulation = manipulation / n;
    summary.mean_clip = clip / n;
    summary.overall_risk = weights.duplicate * summary.mean_duplicate
        + weights.manipulation * summary.mean_manipulation
        + weights.consistency * consistency_risk(summary.mean_clip);
    summary
}
