//! Test doubles for the generation domain

use std::path::PathBuf;

use crate::generation::{Category, CapabilitySettings, FormatterCapability, Language, RefCounts};
use crate::model::{Method, Type};

/// Capability that renders plain markers and records references
pub struct RecordingCapability {
    pub language: Language,
    pub api_version: String,
    pub output_root: PathBuf,
    pub resets: usize,
    pub record_refs: bool,
    pub named_parameters: bool,
    pub multi_api: bool,
    pub streams: bool,
    pub constants: Option<PathBuf>,
}

impl RecordingCapability {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            api_version: "4.0".to_string(),
            output_root: PathBuf::from("out"),
            resets: 0,
            record_refs: true,
            named_parameters: false,
            multi_api: true,
            streams: true,
            constants: None,
        }
    }

    /// Capability configured like a registry-built one
    pub fn from_settings(language: Language, settings: &CapabilitySettings) -> Self {
        let mut capability = Self::new(language);
        capability.api_version = settings.api_version.clone();
        capability.output_root = settings.output_root.clone();
        capability
    }

    fn record(&self, method: &Method, refs: &mut RefCounts) {
        if !self.record_refs {
            return;
        }
        for param in &method.params {
            refs.reference_type(&param.type_ref);
        }
        if let Some(result) = &method.result_type {
            refs.reference_type(result);
        }
    }
}

impl FormatterCapability for RecordingCapability {
    fn language(&self) -> Language {
        self.language
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }

    fn reset(&mut self) {
        self.resets += 1;
    }

    fn supports_multi_api(&self) -> bool {
        self.multi_api
    }

    fn will_it_stream(&self) -> bool {
        self.streams
    }

    fn use_functions(&self) -> bool {
        true
    }

    fn use_interfaces(&self) -> bool {
        true
    }

    fn use_named_parameters(&self) -> bool {
        self.named_parameters
    }

    fn comment_header(&self, indent: &str, text: &str) -> String {
        self.comment(indent, text)
    }

    fn comment(&self, indent: &str, text: &str) -> String {
        text.lines()
            .map(|line| format!("{indent}// {line}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn begin_region(&self, indent: &str, description: &str) -> String {
        format!("{indent}BEGIN {description}")
    }

    fn end_region(&self, indent: &str, description: &str) -> String {
        format!("{indent}END {description}")
    }

    fn prologue(&mut self, category: Category, _indent: &str) -> String {
        format!("PROLOGUE {category}")
    }

    fn epilogue(&mut self, category: Category, _indent: &str) -> String {
        format!("EPILOGUE {category}")
    }

    fn declare_method(&mut self, indent: &str, method: &Method, refs: &mut RefCounts) -> String {
        self.record(method, refs);
        format!("{indent}method {}", method.name)
    }

    fn declare_interface(&mut self, indent: &str, method: &Method, refs: &mut RefCounts) -> String {
        self.record(method, refs);
        format!("{indent}interface {}", method.name)
    }

    fn declare_function(&mut self, indent: &str, method: &Method, refs: &mut RefCounts) -> String {
        self.record(method, refs);
        format!("{indent}function {}", method.name)
    }

    fn declare_streamer(&mut self, indent: &str, method: &Method, refs: &mut RefCounts) -> String {
        self.record(method, refs);
        format!("{indent}stream {}", method.name)
    }

    fn declare_type(&mut self, indent: &str, ty: &Type, refs: &mut RefCounts) -> String {
        if self.record_refs {
            for prop in &ty.properties {
                refs.reference_type(&prop.type_ref);
            }
        }
        format!("{indent}type {}", ty.name)
    }

    fn file_name(&self, category: Category) -> PathBuf {
        self.output_root
            .join(self.language.to_string())
            .join(&self.api_version)
            .join(format!("{category}.{}", self.file_extension()))
    }

    fn constants_file(&self) -> Option<PathBuf> {
        self.constants.clone()
    }
}
