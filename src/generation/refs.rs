//! Per-pass type reference counts
//!
//! Counts are a side-table keyed by type name so the [`ApiModel`] stays a
//! pure value. A table is reused across languages for the same model; the
//! first generator of every pass clears it.

use std::collections::HashMap;

use crate::model::{ApiModel, TypeRef};

#[derive(Debug, Clone)]
pub struct RefCounts {
    counts: HashMap<String, usize>,
    pending_reset: bool,
}

impl RefCounts {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
            pending_reset: true,
        }
    }

    /// Mark the start of a new language pass
    pub fn begin_pass(&mut self) {
        self.pending_reset = true;
    }

    /// Zero every model type if this is the first generator of the pass
    pub fn reset_if_pending(&mut self, model: &ApiModel) {
        if !self.pending_reset {
            return;
        }
        self.counts.clear();
        for name in model.types.keys() {
            self.counts.insert(name.clone(), 0);
        }
        self.pending_reset = false;
    }

    /// Record one reference to the named type
    pub fn reference(&mut self, name: &str) {
        *self.counts.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Record a reference to the innermost named type of `type_ref`
    pub fn reference_type(&mut self, type_ref: &TypeRef) {
        self.reference(type_ref.base_name());
    }

    pub fn count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn is_referenced(&self, name: &str) -> bool {
        self.count(name) > 0
    }
}

impl Default for RefCounts {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Type;

    fn model_with(names: &[&str]) -> ApiModel {
        let mut model = ApiModel::default();
        for name in names {
            model.types.insert(name.to_string(), Type::intrinsic(name));
        }
        model
    }

    #[test]
    fn test_reset_happens_once_per_pass() {
        let model = model_with(&["User", "Role"]);
        let mut refs = RefCounts::new();

        refs.reset_if_pending(&model);
        refs.reference("User");
        refs.reference_type(&TypeRef::Array(Box::new(TypeRef::named("User"))));
        assert_eq!(refs.count("User"), 2);

        // second generator of the same pass keeps the counts
        refs.reset_if_pending(&model);
        assert_eq!(refs.count("User"), 2);

        refs.begin_pass();
        refs.reset_if_pending(&model);
        assert_eq!(refs.count("User"), 0);
        assert!(!refs.is_referenced("Role"));
    }

    #[test]
    fn test_unknown_names_count_zero() {
        let refs = RefCounts::new();
        assert_eq!(refs.count("Missing"), 0);
    }
}
