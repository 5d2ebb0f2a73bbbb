//! Legacy-to-current schema conversion with an on-disk cache
//!
//! Swagger 2 schemas are converted by the external `swagger2openapi` tool.
//! OpenAPI 3 schemas are re-serialized as-is. Both then get the idempotent
//! [`upgrade_spec`] pass.

use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

use crate::infrastructure::shell::{CommandExecutor, DEFAULT_TOOL_TIMEOUT, Invocation};
use crate::infrastructure::spec::SpecError;

/// External tool converting Swagger 2 into OpenAPI 3
pub const CONVERSION_TOOL: &str = "swagger2openapi";

/// Tag given to operations that declare none
pub const DEFAULT_TAG: &str = "Misc";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaDialect {
    /// Swagger 2.x
    Legacy,
    /// OpenAPI 3.x
    Current,
}

/// Identify the dialect a schema declares
pub fn detect_dialect(spec: &JsonValue) -> Option<SchemaDialect> {
    if spec.get("swagger").is_some() {
        Some(SchemaDialect::Legacy)
    } else if spec.get("openapi").is_some() {
        Some(SchemaDialect::Current)
    } else {
        None
    }
}

pub struct SchemaConverter {
    executor: Arc<dyn CommandExecutor>,
    timeout: Duration,
}

impl SchemaConverter {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Convert `source` into the current dialect at `target`.
    ///
    /// An existing `target` is returned untouched unless `force` is set.
    pub async fn convert(
        &self,
        source: &Path,
        target: &Path,
        force: bool,
    ) -> Result<PathBuf, SpecError> {
        if !force && fs::try_exists(target).await? {
            debug!(target = %target.display(), "Converted schema is cached");
            return Ok(target.to_path_buf());
        }

        let text = fs::read_to_string(source).await?;
        let spec: JsonValue = serde_json::from_str(&text)
            .map_err(|e| SpecError::Parse(format!("{}: {e}", source.display())))?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        match detect_dialect(&spec) {
            Some(SchemaDialect::Legacy) => {
                if fs::try_exists(target).await? {
                    fs::remove_file(target).await?;
                }
                info!(
                    source = %source.display(),
                    target = %target.display(),
                    "Converting legacy schema"
                );
                let invocation = Invocation::new(CONVERSION_TOOL)
                    .arg(source.to_string_lossy())
                    .args(["-p", "-o"])
                    .arg(target.to_string_lossy())
                    .timeout(self.timeout);
                self.executor
                    .run(&invocation)
                    .await
                    .map_err(|failure| SpecError::ConversionFailed {
                        path: source.to_path_buf(),
                        reason: failure.to_string(),
                    })?;
            }
            Some(SchemaDialect::Current) => {
                fs::write(target, serde_json::to_string_pretty(&spec)?).await?;
            }
            None => return Err(SpecError::UnrecognizedSchema(source.to_path_buf())),
        }

        if !fs::try_exists(target).await? {
            return Err(SpecError::ConversionFailed {
                path: source.to_path_buf(),
                reason: format!("{} was not created", target.display()),
            });
        }

        let converted = fs::read_to_string(target).await?;
        let mut value: JsonValue = serde_json::from_str(&converted)
            .map_err(|e| SpecError::Parse(format!("{}: {e}", target.display())))?;
        let fixes = upgrade_spec(&mut value);
        debug!(target = %target.display(), fixes, "Upgraded converted schema");
        fs::write(target, serde_json::to_string_pretty(&value)?).await?;

        Ok(target.to_path_buf())
    }
}

/// Fix known leftovers of conversion in place, returning how many were fixed.
///
/// Running it twice changes nothing the second time.
pub fn upgrade_spec(spec: &mut JsonValue) -> usize {
    let mut fixes = upgrade_node(spec);

    if let Some(paths) = spec.get_mut("paths").and_then(JsonValue::as_object_mut) {
        for item in paths.values_mut() {
            let Some(item) = item.as_object_mut() else {
                continue;
            };
            for (verb, operation) in item.iter_mut() {
                if !crate::infrastructure::spec::parser::HTTP_METHODS.contains(&verb.as_str()) {
                    continue;
                }
                let Some(operation) = operation.as_object_mut() else {
                    continue;
                };
                let has_tags = operation
                    .get("tags")
                    .and_then(JsonValue::as_array)
                    .is_some_and(|tags| !tags.is_empty());
                if !has_tags {
                    operation.insert("tags".to_string(), serde_json::json!([DEFAULT_TAG]));
                    fixes += 1;
                }
            }
        }
    }
    fixes
}

fn upgrade_node(node: &mut JsonValue) -> usize {
    let mut fixes = 0;
    match node {
        JsonValue::Object(map) => {
            if let Some(JsonValue::String(reference)) = map.get_mut("$ref") {
                if let Some(name) = reference.strip_prefix("#/definitions/") {
                    *reference = format!("#/components/schemas/{name}");
                    fixes += 1;
                }
            }
            if let Some(nullable) = map.remove("x-looker-nullable") {
                map.entry("nullable").or_insert(nullable);
                fixes += 1;
            }
            for child in map.values_mut() {
                fixes += upgrade_node(child);
            }
        }
        JsonValue::Array(items) => {
            for child in items {
                fixes += upgrade_node(child);
            }
        }
        _ => {}
    }
    fixes
}
