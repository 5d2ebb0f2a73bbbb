//! Registry of per-language capability factories

use std::collections::HashMap;

use crate::generation::{CapabilitySettings, FormatterCapability, GenerationError, Language};

/// Builds a fresh capability for one language and API version
pub type CapabilityFactory = fn(&CapabilitySettings) -> Box<dyn FormatterCapability>;

pub struct CapabilityRegistry {
    factories: HashMap<Language, CapabilityFactory>,
}

impl CapabilityRegistry {
    /// Registry with the built-in TypeScript and Python capabilities
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Language::TypeScript, |settings| {
            Box::new(super::TypeScriptCapability::new(settings))
        });
        registry.register(Language::Python, |settings| {
            Box::new(super::PythonCapability::new(settings))
        });
        registry
    }

    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register(&mut self, language: Language, factory: CapabilityFactory) {
        self.factories.insert(language, factory);
    }

    pub fn create(
        &self,
        language: Language,
        settings: &CapabilitySettings,
    ) -> Result<Box<dyn FormatterCapability>, GenerationError> {
        self.factories
            .get(&language)
            .map(|factory| factory(settings))
            .ok_or(GenerationError::MissingCapability(language))
    }

    pub fn has_capability(&self, language: Language) -> bool {
        self.factories.contains_key(&language)
    }

    /// Registered languages in canonical order
    pub fn supported_languages(&self) -> Vec<Language> {
        Language::all()
            .into_iter()
            .filter(|lang| self.has_capability(*lang))
            .collect()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
