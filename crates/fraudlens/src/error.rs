use std::path::PathBuf;
use thiserror::Error;

use crate::job::JobState;

#[derive(Error, Debug)]
pub enum FraudlensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("Upload rejected: {0}")]
    Upload(#[from] UploadError),

    #[error("Invalid job transition: {0}")]
    Transition(#[from] TransitionError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("No tokio runtime available to dispatch analyses")]
    NoRuntime,

    #[error("Job '{0}' is not part of the current batch")]
    UnknownJob(String),

    #[error("Job transition failed: {0}")]
    Transition(#[from] TransitionError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("job '{job_id}' is already {state} and cannot change state")]
    Terminal { job_id: String, state: JobState },

    #[error("job '{job_id}' is {state}, expected {expected}")]
    UnexpectedState {
        job_id: String,
        state: JobState,
        expected: JobState,
    },
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Failed to read file '{path}': {source}")]
    ReadMetadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} is not an image file ({content_type})")]
    NotAnImage { name: String, content_type: String },

    #[error("{name} is larger than {limit} bytes ({size} bytes)")]
    TooLarge { name: String, size: u64, limit: u64 },
}

pub type Result<T> = std::result::Result<T, FraudlensError>;
