//! Language capabilities and post-generation reformatting

pub mod capabilities;
pub mod reformatter;

pub use capabilities::{CapabilityFactory, CapabilityRegistry, PythonCapability, TypeScriptCapability};
pub use reformatter::{FilesFormatter, LanguageReformatter, ReformatOutcome, StampContext, StampRule};
