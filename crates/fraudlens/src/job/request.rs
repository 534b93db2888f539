use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::UploadError;

/// Fallback content type for files whose extension is unknown.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// One submitted file. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub id: String,
    /// Opaque handle to the file contents.
    pub path: PathBuf,
    pub display_name: String,
    pub size_bytes: u64,
    pub content_type: String,
}

impl AnalysisRequest {
    fn new_internal(
        path: PathBuf,
        display_name: Option<String>,
        size_bytes: u64,
        content_type: Option<String>,
    ) -> Self {
        let content_type = content_type
            .or_else(|| Self::detect_content_type(&path))
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let display_name = display_name.unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string())
        });
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            path,
            display_name,
            size_bytes,
            content_type,
        }
    }

    /// Creates a request with the content type detected from the path.
    pub fn new(path: PathBuf, size_bytes: u64) -> Self {
        Self::new_internal(path, None, size_bytes, None)
    }

    /// Creates a request with an explicit display name and content type.
    pub fn with_details(
        path: PathBuf,
        display_name: String,
        size_bytes: u64,
        content_type: String,
    ) -> Self {
        Self::new_internal(path, Some(display_name), size_bytes, Some(content_type))
    }

    /// Creates a request for a file on disk, reading its size.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| UploadError::ReadMetadata {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::new(path.to_path_buf(), metadata.len()))
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    fn detect_content_type(path: &Path) -> Option<String> {
        mime_guess::from_path(path).first().map(|m| m.to_string())
    }
}

/// Free-text project description shared by every job of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Description(String);

impl Description {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for Description {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Description {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Admission rules the upload collaborator applies before a file becomes a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_file_bytes: u64,
}

impl UploadPolicy {
    pub fn new(max_file_bytes: u64) -> Self {
        Self { max_file_bytes }
    }

    pub fn check(&self, request: &AnalysisRequest) -> Result<(), UploadError> {
        if !request.is_image() {
            return Err(UploadError::NotAnImage {
                name: request.display_name.clone(),
                content_type: request.content_type.clone(),
            });
        }
        if request.size_bytes > self.max_file_bytes {
            return Err(UploadError::TooLarge {
                name: request.display_name.clone(),
                size: request.size_bytes,
                limit: self.max_file_bytes,
            });
        }
        Ok(())
    }

    /// Splits candidate paths into accepted requests and rejections, keeping order.
    pub fn admit<P: AsRef<Path>>(&self, paths: &[P]) -> (Vec<AnalysisRequest>, Vec<UploadError>) {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for path in paths {
            match AnalysisRequest::from_path(path).and_then(|r| self.check(&r).map(|_| r)) {
                Ok(request) => accepted.push(request),
                Err(e) => {
                    log::info!("Rejected upload: {}", e);
                    rejected.push(e);
                }
            }
        }

        (accepted, rejected)
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(crate::config::schema::DEFAULT_MAX_FILE_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_request_content_type_detection() {
        let request = AnalysisRequest::new(PathBuf::from("/uploads/photo.jpg"), 10);
        assert_eq!(request.content_type, "image/jpeg");
        assert_eq!(request.display_name, "photo.jpg");
        assert!(!request.id.is_empty());

        let request = AnalysisRequest::new(PathBuf::from("/uploads/blob.xyz123"), 10);
        assert_eq!(request.content_type, DEFAULT_CONTENT_TYPE);
        assert!(!request.is_image());
    }

    #[test]
    fn test_request_explicit_details_override_detection() {
        let request = AnalysisRequest::with_details(
            PathBuf::from("/uploads/blob"),
            "Site photo".to_string(),
            42,
            "image/png".to_string(),
        );
        assert_eq!(request.display_name, "Site photo");
        assert_eq!(request.content_type, "image/png");
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = AnalysisRequest::new(PathBuf::from("a.png"), 1);
        let b = AnalysisRequest::new(PathBuf::from("a.png"), 1);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_from_path_reads_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.png");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0u8; 128]).unwrap();

        let request = AnalysisRequest::from_path(&path).unwrap();
        assert_eq!(request.size_bytes, 128);
        assert_eq!(request.content_type, "image/png");
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = AnalysisRequest::from_path("/nonexistent/scan.png");
        assert!(matches!(result, Err(UploadError::ReadMetadata { .. })));
    }

    #[test]
    fn test_policy_rejects_non_images_and_large_files() {
        let policy = UploadPolicy::new(1024);

        let text = AnalysisRequest::new(PathBuf::from("notes.txt"), 10);
        assert!(matches!(
            policy.check(&text),
            Err(UploadError::NotAnImage { .. })
        ));

        let big = AnalysisRequest::new(PathBuf::from("big.png"), 2048);
        assert!(matches!(
            policy.check(&big),
            Err(UploadError::TooLarge { size: 2048, .. })
        ));

        let ok = AnalysisRequest::new(PathBuf::from("ok.png"), 1024);
        assert!(policy.check(&ok).is_ok());
    }

    #[test]
    fn test_policy_admit_keeps_order() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.png");
        let skipped = dir.path().join("skipped.txt");
        let second = dir.path().join("second.jpg");
        for path in [&first, &skipped, &second] {
            std::fs::write(path, b"data").unwrap();
        }

        let (accepted, rejected) = UploadPolicy::default().admit(&[&first, &skipped, &second]);
        let names: Vec<_> = accepted.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, vec!["first.png", "second.jpg"]);
        assert_eq!(rejected.len(), 1);
    }

    #[test]
    fn test_description() {
        let description = Description::from("Solar panel install, roof north side");
        assert_eq!(description.as_str(), "Solar panel install, roof north side");
        assert!(!description.is_empty());
        assert!(Description::default().is_empty());
    }
}
