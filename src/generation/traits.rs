//! Port interfaces for the generation domain

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::generation::{Category, GeneratedFile, GenerationError, Language, RefCounts};
use crate::infrastructure::spec::{SpecError, VersionInfo};
use crate::model::{ApiModel, Method, Type};

/// Settings a capability needs to name files and stamp versions
#[derive(Debug, Clone)]
pub struct CapabilitySettings {
    /// Root directory all SDK sources are written under
    pub output_root: PathBuf,
    /// API version this instance renders
    pub api_version: String,
    /// Every API version requested for the run
    pub api_versions: Vec<String>,
    /// Environment variable prefix baked into generated SDKs
    pub env_prefix: String,
}

impl CapabilitySettings {
    pub fn new(output_root: impl Into<PathBuf>, api_version: impl Into<String>) -> Self {
        let api_version = api_version.into();
        Self {
            output_root: output_root.into(),
            api_versions: vec![api_version.clone()],
            api_version,
            env_prefix: crate::core::config::DEFAULT_ENV_PREFIX.to_string(),
        }
    }
}

/// Per-language rendering strategy injected into every generator.
///
/// Declaration renderers receive the pass's [`RefCounts`] and record each
/// named type they reference. `reset` clears whatever the capability tracks
/// for a single render (for example accumulated imports).
pub trait FormatterCapability: Send {
    fn language(&self) -> Language;

    fn file_extension(&self) -> &'static str {
        self.language().file_extension()
    }

    fn api_version(&self) -> &str;

    fn reset(&mut self);

    fn supports_multi_api(&self) -> bool {
        true
    }

    fn will_it_stream(&self) -> bool {
        false
    }

    fn use_functions(&self) -> bool {
        false
    }

    fn use_interfaces(&self) -> bool {
        false
    }

    /// True when methods take named arguments instead of Request objects
    fn use_named_parameters(&self) -> bool {
        false
    }

    /// Indentation for items of one category
    fn item_indent(&self, _category: Category) -> &'static str {
        ""
    }

    /// License or banner block at the top of a file
    fn comment_header(&self, indent: &str, text: &str) -> String;

    fn comment(&self, indent: &str, text: &str) -> String;

    fn begin_region(&self, indent: &str, description: &str) -> String;

    fn end_region(&self, indent: &str, description: &str) -> String;

    fn prologue(&mut self, category: Category, indent: &str) -> String;

    fn epilogue(&mut self, category: Category, indent: &str) -> String;

    fn declare_method(&mut self, indent: &str, method: &Method, refs: &mut RefCounts) -> String;

    fn declare_interface(
        &mut self,
        _indent: &str,
        _method: &Method,
        _refs: &mut RefCounts,
    ) -> String {
        String::new()
    }

    fn declare_function(
        &mut self,
        _indent: &str,
        _method: &Method,
        _refs: &mut RefCounts,
    ) -> String {
        String::new()
    }

    fn declare_streamer(
        &mut self,
        _indent: &str,
        _method: &Method,
        _refs: &mut RefCounts,
    ) -> String {
        String::new()
    }

    fn declare_type(&mut self, indent: &str, ty: &Type, refs: &mut RefCounts) -> String;

    /// Output path for one emission category
    fn file_name(&self, category: Category) -> PathBuf;

    /// Source file holding the SDK version constants
    fn constants_file(&self) -> Option<PathBuf> {
        None
    }
}

/// Writes generated files
#[async_trait]
pub trait OutputService: Send + Sync {
    async fn write_file(&self, file: &GeneratedFile) -> Result<(), GenerationError>;

    async fn ensure_directory(&self, path: &Path) -> Result<(), GenerationError>;
}

/// Supplies the parsed model for each requested API version
#[async_trait]
pub trait ModelSource: Send + Sync {
    /// Model for `api_version`, resolving and loading it on first use
    async fn model(&self, api_version: &str) -> Result<Arc<ApiModel>, SpecError>;

    /// Release metadata used for version stamping
    fn version_info(&self) -> Option<VersionInfo>;
}
