//! Errors raised while acquiring, converting and loading API schemas

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Timed out reading {0}")]
    Timeout(String),

    #[error("Unrecognized schema format in {}", .0.display())]
    UnrecognizedSchema(PathBuf),

    #[error("Failed to parse API schema: {0}")]
    Parse(String),

    #[error("Schema conversion of {} failed: {reason}", .path.display())]
    ConversionFailed { path: PathBuf, reason: String },

    #[error("API version {0} is not a supported version")]
    VersionNotFound(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpecError {
    /// Authentication and timeout failures stop the whole run
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, SpecError::Authentication(_) | SpecError::Timeout(_))
    }
}
