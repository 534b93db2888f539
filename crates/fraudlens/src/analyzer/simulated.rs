//! Placeholder analyzer.
//!
//! Reads the real file and its real pixel dimensions, then draws the three
//! scores at random after an artificial, position-staggered delay. It stands
//! in for the hashing / CNN / vision-language models until those exist.

use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use image::{ImageError, ImageFormat, ImageReader};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::analyzer::{AnalysisInput, Analyzer};
use crate::config::{Config, SimulationConfig};
use crate::job::{AnalysisError, AnalysisResult, Metadata};

pub struct SimulatedAnalyzer {
    base_latency: Duration,
    stagger: Duration,
    /// Files started together; the stagger restarts for every wave.
    wave_size: usize,
    max_latency: Option<Duration>,
    rng: Mutex<StdRng>,
}

impl SimulatedAnalyzer {
    /// Staggers by absolute position with no upper bound.
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            base_latency: Duration::from_millis(config.base_latency_ms),
            stagger: Duration::from_millis(config.stagger_ms),
            wave_size: usize::MAX,
            max_latency: None,
            rng: Mutex::new(rng),
        }
    }

    /// Staggers within each concurrency wave and finishes well inside the
    /// analyzer timeout.
    pub fn from_config(config: &Config) -> Self {
        let timeout = Duration::from_millis(config.analyzer_timeout_ms);
        Self::new(&config.simulation)
            .with_wave_size(config.max_concurrent_analyses)
            .with_max_latency(timeout * 3 / 4)
    }

    pub fn with_wave_size(mut self, wave_size: usize) -> Self {
        self.wave_size = wave_size.max(1);
        self
    }

    pub fn with_max_latency(mut self, max_latency: Duration) -> Self {
        self.max_latency = Some(max_latency);
        self
    }

    /// Delay before the result for the file at `sequence` is produced.
    pub fn latency_for(&self, sequence: usize) -> Duration {
        let position = u32::try_from(sequence % self.wave_size).unwrap_or(u32::MAX);
        let latency = self
            .base_latency
            .saturating_add(self.stagger.saturating_mul(position));
        match self.max_latency {
            Some(cap) => latency.min(cap),
            None => latency,
        }
    }

    fn draw_scores(&self) -> (f64, f64, f64) {
        let mut rng = match self.rng.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Simulated analyzer RNG lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        (
            rng.gen_range(0.0..100.0),
            rng.gen_range(0.0..100.0),
            rng.gen_range(0.0..100.0),
        )
    }
}

impl Default for SimulatedAnalyzer {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[async_trait]
impl Analyzer for SimulatedAnalyzer {
    async fn analyze(&self, input: AnalysisInput<'_>) -> Result<AnalysisResult, AnalysisError> {
        let path = &input.request.path;
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AnalysisError::unreadable_file(format!("{}: {}", input.request.display_name, e))
        })?;

        let (format, width, height) = inspect_image(&bytes)?;
        let exif_present = has_exif(&bytes, format);

        tokio::time::sleep(self.latency_for(input.sequence)).await;

        let (duplicate_score, manipulation_score, clip_similarity) = self.draw_scores();
        log::debug!(
            "Simulated analysis of {} ({:?}, {}x{})",
            input.request.display_name,
            format,
            width,
            height
        );

        Ok(AnalysisResult {
            duplicate_score,
            manipulation_score,
            clip_similarity,
            metadata: Metadata {
                exif_stripped: !exif_present,
                dimensions: Some(format!("{}x{}", width, height)),
                file_size_label: format_size_label(bytes.len() as u64),
                completed_at: Utc::now(),
            },
        })
    }
}

/// Formats a byte count the way result cards show it, e.g. "2.4 MB".
pub fn format_size_label(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
}

fn inspect_image(bytes: &[u8]) -> Result<(ImageFormat, u32, u32), AnalysisError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AnalysisError::unreadable_file(e.to_string()))?;

    let format = reader
        .format()
        .ok_or_else(|| AnalysisError::unsupported_format("unrecognised image format"))?;

    let (width, height) = reader.into_dimensions().map_err(|e| match e {
        ImageError::Unsupported(inner) => AnalysisError::unsupported_format(inner.to_string()),
        other => AnalysisError::unreadable_file(other.to_string()),
    })?;

    Ok((format, width, height))
}

fn has_exif(bytes: &[u8], format: ImageFormat) -> bool {
    let marker: &[u8] = match format {
        ImageFormat::Jpeg => b"Exif\0\0",
        ImageFormat::Png => b"eXIf",
        ImageFormat::WebP => b"EXIF",
        // TIFF is itself an EXIF container
        ImageFormat::Tiff => return true,
        _ => return false,
    };
    bytes.windows(marker.len()).any(|w| w == marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{AnalysisRequest, Description, ErrorKind};
    use std::path::Path;
    use tempfile::TempDir;

    fn instant_config(seed: Option<u64>) -> SimulationConfig {
        SimulationConfig {
            base_latency_ms: 0,
            stagger_ms: 0,
            seed,
        }
    }

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        image::RgbImage::new(width, height).save(&path).unwrap();
        path
    }

    #[test]
    fn test_latency_staggers_by_position() {
        let analyzer = SimulatedAnalyzer::new(&SimulationConfig::default());
        assert_eq!(analyzer.latency_for(0), Duration::from_millis(2000));
        assert_eq!(analyzer.latency_for(3), Duration::from_millis(5000));
    }

    #[test]
    fn test_stagger_restarts_each_wave() {
        let config = Config {
            max_concurrent_analyses: 4,
            ..Config::default()
        };
        let analyzer = SimulatedAnalyzer::from_config(&config);
        assert_eq!(analyzer.latency_for(0), Duration::from_millis(2000));
        assert_eq!(analyzer.latency_for(3), Duration::from_millis(5000));
        assert_eq!(analyzer.latency_for(4), Duration::from_millis(2000));
        assert_eq!(analyzer.latency_for(7), Duration::from_millis(5000));
    }

    #[test]
    fn test_default_latency_stays_below_timeout() {
        let config = Config::default();
        let timeout = Duration::from_millis(config.analyzer_timeout_ms);
        let analyzer = SimulatedAnalyzer::default();
        assert!((0..1000).all(|sequence| analyzer.latency_for(sequence) < timeout));

        let wide = Config {
            max_concurrent_analyses: 64,
            ..Config::default()
        };
        let analyzer = SimulatedAnalyzer::from_config(&wide);
        assert_eq!(analyzer.latency_for(40), Duration::from_millis(22_500));
    }

    #[test]
    fn test_format_size_label() {
        assert_eq!(format_size_label(0), "0.0 MB");
        assert_eq!(format_size_label(1024 * 1024), "1.0 MB");
        assert_eq!(format_size_label(2_516_582), "2.4 MB");
    }

    #[test]
    fn test_has_exif_markers() {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x10];
        jpeg.extend_from_slice(b"Exif\0\0");
        assert!(has_exif(&jpeg, ImageFormat::Jpeg));
        assert!(!has_exif(&[0xFF, 0xD8, 0xFF, 0xE0], ImageFormat::Jpeg));
        assert!(!has_exif(b"GIF89a", ImageFormat::Gif));
    }

    #[tokio::test]
    async fn test_analyze_png() {
        let dir = TempDir::new().unwrap();
        let path = write_png(dir.path(), "roof.png", 4, 3);
        let request = AnalysisRequest::from_path(&path).unwrap();
        let description = Description::from("roof repair");
        let analyzer = SimulatedAnalyzer::new(&instant_config(Some(1)));

        let result = analyzer
            .analyze(AnalysisInput {
                request: &request,
                description: &description,
                sequence: 0,
            })
            .await
            .unwrap();

        assert!(result.validate().is_ok());
        assert_eq!(result.metadata.dimensions.as_deref(), Some("4x3"));
        assert!(result.metadata.exif_stripped);
        assert_eq!(result.metadata.file_size_label, "0.0 MB");
    }

    #[tokio::test]
    async fn test_seeded_scores_are_reproducible() {
        let dir = TempDir::new().unwrap();
        let path = write_png(dir.path(), "a.png", 2, 2);
        let request = AnalysisRequest::from_path(&path).unwrap();
        let description = Description::default();
        let input = AnalysisInput {
            request: &request,
            description: &description,
            sequence: 0,
        };

        let first = SimulatedAnalyzer::new(&instant_config(Some(42)))
            .analyze(input)
            .await
            .unwrap();
        let second = SimulatedAnalyzer::new(&instant_config(Some(42)))
            .analyze(input)
            .await
            .unwrap();

        assert_eq!(first.duplicate_score, second.duplicate_score);
        assert_eq!(first.manipulation_score, second.manipulation_score);
        assert_eq!(first.clip_similarity, second.clip_similarity);
    }

    #[tokio::test]
    async fn test_missing_file_is_unreadable() {
        let request = AnalysisRequest::new("/nonexistent/ghost.png".into(), 10);
        let description = Description::default();
        let err = SimulatedAnalyzer::new(&instant_config(None))
            .analyze(AnalysisInput {
                request: &request,
                description: &description,
                sequence: 0,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnreadableFile);
    }

    #[tokio::test]
    async fn test_non_image_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"plain text pretending to be an image").unwrap();
        let request = AnalysisRequest::from_path(&path).unwrap();
        let description = Description::default();

        let err = SimulatedAnalyzer::new(&instant_config(None))
            .analyze(AnalysisInput {
                request: &request,
                description: &description,
                sequence: 0,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedFormat);
    }
}
