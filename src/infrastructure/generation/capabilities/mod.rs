//! Concrete per-language rendering capabilities

pub mod python;
pub mod registry;
pub mod typescript;

pub use python::PythonCapability;
pub use registry::{CapabilityFactory, CapabilityRegistry};
pub use typescript::TypeScriptCapability;

use crate::model::Method;

/// Documentation lines shared by every method flavour
fn method_doc(method: &Method, result: &str) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(summary) = &method.summary {
        lines.push(summary.clone());
        lines.push(String::new());
    }
    if let Some(description) = &method.description {
        lines.extend(description.lines().map(str::to_string));
        lines.push(String::new());
    }
    lines.push(format!(
        "{} {} -> {}",
        method.http_method, method.endpoint, result
    ));
    if method.deprecated {
        lines.push(String::new());
        lines.push("@deprecated".to_string());
    }
    lines
}

/// API version without separators, as used in SDK class names
fn version_suffix(api_version: &str) -> String {
    api_version.chars().filter(char::is_ascii_alphanumeric).collect()
}
