//! Core plumbing shared by every layer of the generator
//!
//! Configuration loading, the umbrella error type and identifier
//! utilities used by the parser.

pub mod config;
pub mod error;
pub mod utils;

pub use config::SdkConfig;
pub use error::{Error, Result};
