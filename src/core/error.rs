//! Error handling for the SDK generator.
//!
//! This module defines the umbrella error type `Error` used by the
//! configuration layer and the binary, along with a convenient `Result`
//! alias. Layer-specific errors (`SpecError`, `GenerationError`) convert
//! into it.
//!
//! # Examples
//!
//! ```
//! use sdk_codegen::core::error::{Error, Result};
//!
//! fn might_fail() -> Result<()> {
//!     Err(Error::config("base_url is required"))
//! }
//! assert!(might_fail().is_err());
//! ```

use thiserror::Error;

use crate::generation::GenerationError;
use crate::infrastructure::spec::SpecError;

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for generator operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// INI parsing error
    #[error("INI parsing error: {0}")]
    Ini(#[from] ini::ParseError),

    /// Override file error
    #[error("Override file error: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// Spec acquisition error
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// Generation error
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Config(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Config(s)
    }
}
