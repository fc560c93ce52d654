// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkflowError>;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid sidecar {path}: {source}")]
    SidecarParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Sidecar {path} is missing required field {field}")]
    MissingField { path: PathBuf, field: String },

    #[error("Table {file} has no column named {column}")]
    MissingColumn { file: String, column: String },

    #[error("Table error in {file}: {message}")]
    Table { file: String, message: String },

    #[error("Layout conflict at {path}: {message}")]
    LayoutConflict { path: PathBuf, message: String },

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("recon-all {stage} failed for {subject} ({status})")]
    ReconFailed {
        subject: String,
        stage: String,
        status: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl WorkflowError {
    pub fn file_operation(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileOperation {
            path: path.into(),
            source,
        }
    }
}
