pub mod request;
pub mod result;
pub mod state;

pub use request::{AnalysisRequest, Description, UploadPolicy};
pub use result::{AnalysisError, AnalysisResult, ErrorKind, Metadata};
pub use state::{AnalysisJob, JobState, JobStatus};
