//! Builders for requests, images and orchestrators.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fraudlens::analyzer::Analyzer;
use fraudlens::{AnalysisOrchestrator, AnalysisRequest, OrchestratorConfig};

/// Requests for files that only need a name; the scripted analyzer never reads them.
pub fn requests(names: &[&str]) -> Vec<AnalysisRequest> {
    names
        .iter()
        .map(|name| AnalysisRequest::new(PathBuf::from(name), 1024))
        .collect()
}

/// `img0.jpg` .. `img{n-1}.jpg`.
pub fn numbered_requests(n: usize) -> Vec<AnalysisRequest> {
    (0..n)
        .map(|i| AnalysisRequest::new(PathBuf::from(format!("img{}.jpg", i)), 1024))
        .collect()
}

pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    image::RgbImage::new(width, height)
        .save(&path)
        .expect("Failed to write test image");
    path
}

pub fn orchestrator_with(
    analyzer: Arc<dyn Analyzer>,
    max_concurrent: usize,
) -> AnalysisOrchestrator {
    let config = OrchestratorConfig::default()
        .with_max_concurrent_analyses(max_concurrent)
        .with_analyzer_timeout(Duration::from_secs(10));
    AnalysisOrchestrator::new(analyzer, config).expect("Failed to create orchestrator")
}

/// Config JSON with instant, seeded simulation.
pub fn instant_config_json(max_concurrent: usize) -> String {
    format!(
        r#"{{
            "version": "1.0",
            "maxConcurrentAnalyses": {},
            "analyzerTimeoutMs": 5000,
            "simulation": {{"baseLatencyMs": 0, "staggerMs": 0, "seed": 7}}
        }}"#,
        max_concurrent
    )
}
