//! Human-facing reading of scores: tiers plus the sentence shown for each.
//!
//! A failed job is [`JobAssessment::Unavailable`]. It never falls back to a
//! Low tier, which would read as a clean result.

use serde::Serialize;

use crate::classify::{classify_consistency, classify_with, RiskTier, TierThresholds};
use crate::job::{AnalysisError, AnalysisJob, AnalysisResult, JobStatus};
use crate::metrics::BatchSummary;

/// One scored dimension of an image.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionAssessment {
    pub score: f64,
    pub tier: RiskTier,
    pub finding: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAssessment {
    pub duplicate: DimensionAssessment,
    pub manipulation: DimensionAssessment,
    /// Tiered on the inverted similarity; `score` keeps the raw similarity.
    pub consistency: DimensionAssessment,
}

impl ImageAssessment {
    pub fn from_result(result: &AnalysisResult, thresholds: &TierThresholds) -> Self {
        let duplicate = classify_with(result.duplicate_score, thresholds);
        let manipulation = classify_with(result.manipulation_score, thresholds);
        let consistency = classify_consistency(result.clip_similarity, thresholds);

        Self {
            duplicate: DimensionAssessment {
                score: result.duplicate_score,
                tier: duplicate,
                finding: duplicate_finding(duplicate),
            },
            manipulation: DimensionAssessment {
                score: result.manipulation_score,
                tier: manipulation,
                finding: manipulation_finding(manipulation),
            },
            consistency: DimensionAssessment {
                score: result.clip_similarity,
                tier: consistency,
                finding: consistency_finding(consistency),
            },
        }
    }

    /// Worst tier across the three dimensions.
    pub fn highest_tier(&self) -> RiskTier {
        self.duplicate
            .tier
            .max(self.manipulation.tier)
            .max(self.consistency.tier)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum JobAssessment {
    /// Queued or running.
    Pending,
    Assessed(ImageAssessment),
    Unavailable { error: AnalysisError },
}

impl JobAssessment {
    pub fn from_job(job: &AnalysisJob, thresholds: &TierThresholds) -> Self {
        match &job.status {
            JobStatus::Queued | JobStatus::Running { .. } => JobAssessment::Pending,
            JobStatus::Succeeded { result, .. } => {
                JobAssessment::Assessed(ImageAssessment::from_result(result, thresholds))
            }
            JobStatus::Failed { error, .. } => JobAssessment::Unavailable {
                error: error.clone(),
            },
        }
    }

    pub fn tiers(&self) -> Option<&ImageAssessment> {
        match self {
            JobAssessment::Assessed(assessment) => Some(assessment),
            _ => None,
        }
    }
}

/// Batch-level reading of a [`BatchSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAssessment {
    /// `None` until at least one job has succeeded.
    pub overall: Option<RiskTier>,
    pub overall_risk: f64,
    pub insights: Vec<&'static str>,
}

impl BatchAssessment {
    pub fn from_summary(summary: &BatchSummary, thresholds: &TierThresholds) -> Self {
        let overall = summary.risk_tier(thresholds);
        let insights = if overall.is_some() {
            vec![
                duplicate_insight(classify_with(summary.mean_duplicate, thresholds)),
                manipulation_insight(classify_with(summary.mean_manipulation, thresholds)),
                consistency_insight(classify_consistency(summary.mean_clip, thresholds)),
            ]
        } else {
            Vec::new()
        };

        Self {
            overall,
            overall_risk: summary.overall_risk,
            insights,
        }
    }
}

fn duplicate_finding(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Low => "No significant matches found in database",
        RiskTier::Medium => "Potential similar images detected",
        RiskTier::High => "High similarity to existing submissions",
    }
}

fn manipulation_finding(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Low => "Image appears authentic and unedited",
        RiskTier::Medium => "Minor editing artifacts detected",
        RiskTier::High => "Significant digital manipulation detected",
    }
}

fn consistency_finding(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Low => "Strong alignment with project description",
        RiskTier::Medium => "Partial consistency with description",
        RiskTier::High => "Poor correlation with provided text",
    }
}

fn duplicate_insight(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Low => "Low duplicate risk across images",
        RiskTier::Medium => "Moderate duplicate patterns detected",
        RiskTier::High => "High duplicate risk in submissions",
    }
}

fn manipulation_insight(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Low => "Images appear authentic",
        RiskTier::Medium => "Some editing artifacts detected",
        RiskTier::High => "Significant manipulation detected",
    }
}

fn consistency_insight(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Low => "Good description alignment",
        RiskTier::Medium => "Partial description consistency",
        RiskTier::High => "Poor image-text matching",
    }
}
