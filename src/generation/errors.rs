//! Error types for the generation domain

use crate::generation::Language;
use crate::infrastructure::spec::SpecError;
use thiserror::Error;

/// Errors that can occur during code generation
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Invalid language: {0}")]
    InvalidLanguage(String),

    #[error("No formatter capability registered for language {0}")]
    MissingCapability(Language),

    #[error("Output error: {0}")]
    OutputError(String),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl GenerationError {
    /// Whether this error should stop the whole run rather than one unit
    pub fn is_run_fatal(&self) -> bool {
        match self {
            GenerationError::Spec(e) => e.is_run_fatal(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_capability_message() {
        let err = GenerationError::MissingCapability(Language::Kotlin);
        assert_eq!(
            err.to_string(),
            "No formatter capability registered for language kotlin"
        );
        assert!(!err.is_run_fatal());
    }

    #[test]
    fn test_run_fatal_follows_spec_error() {
        let err: GenerationError = SpecError::Timeout("https://example.com".to_string()).into();
        assert!(err.is_run_fatal());

        let err: GenerationError = SpecError::Parse("missing paths".to_string()).into();
        assert!(!err.is_run_fatal());
    }
}
