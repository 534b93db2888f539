//! Analyzer output: the result payload and the error descriptor.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest valid score for every dimension.
pub const SCORE_MIN: f64 = 0.0;
/// Highest valid score for every dimension.
pub const SCORE_MAX: f64 = 100.0;

fn dimensions_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+x\d+$").expect("dimensions pattern is valid"))
}

/// File-level facts reported alongside the scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Whether the image carried no EXIF block.
    pub exif_stripped: bool,
    /// Pixel dimensions as "WxH", when the analyzer could determine them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    /// Human-readable size, e.g. "2.4 MB".
    pub file_size_label: String,
    /// When the analyzer finished.
    pub completed_at: DateTime<Utc>,
}

/// Scores produced for one completed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Similarity to previously seen submissions, 0-100.
    pub duplicate_score: f64,
    /// Likelihood of digital editing, 0-100.
    pub manipulation_score: f64,
    /// Agreement between image and description, 0-100 (higher is more consistent).
    pub clip_similarity: f64,
    pub metadata: Metadata,
}

impl AnalysisResult {
    /// Checks the analyzer output contract.
    ///
    /// Out-of-range or non-finite scores and malformed metadata are reported as
    /// `internal-error`; values are never clamped.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let scores = [
            ("duplicateScore", self.duplicate_score),
            ("manipulationScore", self.manipulation_score),
            ("clipSimilarity", self.clip_similarity),
        ];
        for (name, value) in scores {
            if !value.is_finite() || !(SCORE_MIN..=SCORE_MAX).contains(&value) {
                return Err(AnalysisError::internal(format!(
                    "analyzer returned {} = {} outside [0, 100]",
                    name, value
                )));
            }
        }

        if let Some(ref dimensions) = self.metadata.dimensions {
            if !dimensions_pattern().is_match(dimensions) {
                return Err(AnalysisError::internal(format!(
                    "analyzer returned malformed dimensions '{}'",
                    dimensions
                )));
            }
        }

        if self.metadata.file_size_label.trim().is_empty() {
            return Err(AnalysisError::internal(
                "analyzer returned an empty file size label",
            ));
        }

        Ok(())
    }
}

/// Why an analysis did not produce a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    UnreadableFile,
    UnsupportedFormat,
    Timeout,
    InternalError,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnreadableFile => "unreadable-file",
            ErrorKind::UnsupportedFormat => "unsupported-format",
            ErrorKind::Timeout => "timeout",
            ErrorKind::InternalError => "internal-error",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error descriptor stored on a failed job.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct AnalysisError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AnalysisError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unreadable_file(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnreadableFile, message)
    }

    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedFormat, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "analysis cancelled")
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }
}

#[cfg(test)]
pub(crate) fn sample_result(duplicate: f64, manipulation: f64, clip: f64) -> AnalysisResult {
    AnalysisResult {
        duplicate_score: duplicate,
        manipulation_score: manipulation,
        clip_similarity: clip,
        metadata: Metadata {
            exif_stripped: false,
            dimensions: Some("1920x1080".to_string()),
            file_size_label: "1.2 MB".to_string(),
            completed_at: Utc::now(),
        },
    }
}
