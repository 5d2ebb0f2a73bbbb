//! Generation domain
//!
//! Generators walk an [`crate::model::ApiModel`] and delegate every
//! language-specific decision to an injected [`FormatterCapability`]. The
//! orchestrator drives them across languages and API versions.

pub mod errors;
pub mod generators;
pub mod orchestrator;
pub mod refs;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::*;
pub use generators::*;
pub use orchestrator::*;
pub use refs::RefCounts;
pub use traits::*;
pub use types::*;
