//! Batch driver for language × API version generation

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::generation::{
    CapabilitySettings, FormatterCapability, FunctionGenerator, GeneratedFile, GenerationError,
    Generator, InterfaceGenerator, Language, MethodGenerator, ModelSource, OutputService,
    RefCounts, StreamGenerator, TypeGenerator,
};
use crate::infrastructure::generation::{CapabilityRegistry, FilesFormatter};
use crate::infrastructure::spec::VersionInfo;
use crate::model::ApiModel;

/// Run-wide settings
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_root: PathBuf,
    pub env_prefix: String,
    /// Skip streaming method generation for every language
    pub omit_streams: bool,
}

impl RunOptions {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            env_prefix: crate::core::config::DEFAULT_ENV_PREFIX.to_string(),
            omit_streams: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedUnit {
    pub language: Language,
    pub api_version: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub language: Language,
    /// `None` when the whole language failed
    pub api_version: Option<String>,
    pub error: String,
}

/// What a run produced
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub generated: Vec<PathBuf>,
    pub skipped: Vec<SkippedUnit>,
    pub failures: Vec<UnitFailure>,
    /// Languages and the API version their constants were stamped with
    pub stamped: Vec<(Language, String)>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

pub struct SdkOrchestrator {
    models: Arc<dyn ModelSource>,
    registry: CapabilityRegistry,
    output: Arc<dyn OutputService>,
    formatter: FilesFormatter,
    options: RunOptions,
}

impl SdkOrchestrator {
    pub fn new(
        models: Arc<dyn ModelSource>,
        registry: CapabilityRegistry,
        output: Arc<dyn OutputService>,
        formatter: FilesFormatter,
        options: RunOptions,
    ) -> Self {
        Self {
            models,
            registry,
            output,
            formatter,
            options,
        }
    }

    /// Generate every language for every version, in the given order.
    ///
    /// Only authentication and timeout failures abort the run; everything
    /// else is recorded in the report against the affected unit.
    pub async fn run(
        &mut self,
        languages: &[Language],
        versions: &[String],
    ) -> Result<RunReport, GenerationError> {
        let mut report = RunReport::default();
        let last_api = versions.last().map(String::as_str);
        // one table per model, reused by every language
        let mut ref_tables: HashMap<String, RefCounts> = HashMap::new();

        for &language in languages {
            if !self.registry.has_capability(language) {
                let err = GenerationError::MissingCapability(language);
                error!(language = %language, error = %err, "Skipping language");
                report.failures.push(UnitFailure {
                    language,
                    api_version: None,
                    error: err.to_string(),
                });
                continue;
            }

            // capability of the last version this language actually generated
            let mut final_unit: Option<Box<dyn FormatterCapability>> = None;

            for version in versions {
                let settings = CapabilitySettings {
                    output_root: self.options.output_root.clone(),
                    api_version: version.clone(),
                    api_versions: versions.to_vec(),
                    env_prefix: self.options.env_prefix.clone(),
                };
                let mut capability = self.registry.create(language, &settings)?;

                if !capability.supports_multi_api() && Some(version.as_str()) != last_api {
                    warn!(
                        language = %language,
                        version = %version,
                        "Language supports a single API version, skipping"
                    );
                    report.skipped.push(SkippedUnit {
                        language,
                        api_version: version.clone(),
                        reason: "single API version language".to_string(),
                    });
                    continue;
                }

                let model = match self.models.model(version).await {
                    Ok(model) => model,
                    Err(e) if e.is_run_fatal() => return Err(e.into()),
                    Err(e) => {
                        error!(language = %language, version = %version, error = %e, "Failed to load API model");
                        report.failures.push(UnitFailure {
                            language,
                            api_version: Some(version.clone()),
                            error: e.to_string(),
                        });
                        continue;
                    }
                };

                let refs = ref_tables.entry(version.clone()).or_default();
                refs.begin_pass();

                info!(language = %language, version = %version, "Generating SDK sources");
                let outcome = self.generate_unit(&model, capability.as_mut(), refs).await;
                match outcome {
                    Ok(files) => {
                        report.generated.extend(files);
                        final_unit = Some(capability);
                    }
                    Err(e) => {
                        error!(language = %language, version = %version, error = %e, "Generation failed");
                        report.failures.push(UnitFailure {
                            language,
                            api_version: Some(version.clone()),
                            error: e.to_string(),
                        });
                    }
                }
            }

            match final_unit {
                Some(capability) => {
                    let final_version = capability.api_version().to_string();
                    let info = self.models.version_info().map(|info| VersionInfo {
                        api_version: final_version.clone(),
                        ..info
                    });
                    let stamped = self
                        .formatter
                        .version_stamp(
                            language,
                            capability.constants_file().as_deref(),
                            info.as_ref(),
                            &self.options.env_prefix,
                        )
                        .await;
                    if stamped {
                        report.stamped.push((language, final_version));
                    }
                }
                None => warn!(language = %language, "No API version generated, skipping version stamp"),
            }
        }

        self.formatter.reformat_all().await;
        Ok(report)
    }

    /// Run the generators for one language × version and write their output
    async fn generate_unit(
        &mut self,
        model: &ApiModel,
        capability: &mut dyn FormatterCapability,
        refs: &mut RefCounts,
    ) -> Result<Vec<PathBuf>, GenerationError> {
        let mut generators: Vec<Box<dyn Generator>> = Vec::new();
        if capability.use_functions() {
            generators.push(Box::new(FunctionGenerator));
        }
        if capability.use_interfaces() {
            generators.push(Box::new(InterfaceGenerator));
        }
        generators.push(Box::new(MethodGenerator));
        if capability.will_it_stream() {
            generators.push(Box::new(StreamGenerator::new(self.options.omit_streams)));
        }
        generators.push(Box::new(TypeGenerator));

        let mut written = Vec::new();
        for generator in &generators {
            let content = generator.render(model, capability, refs);
            if content.is_empty() {
                continue;
            }
            let path = capability.file_name(generator.category());
            self.output
                .write_file(&GeneratedFile::new(path.clone(), content))
                .await?;
            self.formatter.add_file(path.clone());
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::test_support::RecordingCapability;
    use crate::infrastructure::output::FileSystemOutputService;
    use crate::infrastructure::shell::{CommandOutput, MockCommandExecutor};
    use crate::infrastructure::spec::SpecError;
    use crate::model::{Method, TagInfo, Type, TypeKind, TypeRef};
    use async_trait::async_trait;
    use std::path::Path;
    use tempfile::tempdir;
    use tracing_test::traced_test;

    struct StaticModels {
        models: HashMap<String, Arc<ApiModel>>,
        fatal: Option<String>,
        info: Option<VersionInfo>,
    }

    #[async_trait]
    impl ModelSource for StaticModels {
        async fn model(&self, api_version: &str) -> Result<Arc<ApiModel>, SpecError> {
            if self.fatal.as_deref() == Some(api_version) {
                return Err(SpecError::Authentication("denied".to_string()));
            }
            self.models
                .get(api_version)
                .cloned()
                .ok_or_else(|| SpecError::Parse(format!("no schema for {api_version}")))
        }

        fn version_info(&self) -> Option<VersionInfo> {
            self.info.clone()
        }
    }

    fn sample_model() -> ApiModel {
        let mut model = ApiModel {
            tag_infos: vec![TagInfo {
                name: "User".to_string(),
                description: Some("Manage Users".to_string()),
            }],
            ..Default::default()
        };
        model.tags.insert(
            "User".to_string(),
            vec![Method {
                name: "me".to_string(),
                http_method: "GET".to_string(),
                endpoint: "/user".to_string(),
                summary: None,
                description: None,
                params: Vec::new(),
                result_type: Some(TypeRef::named("User")),
                request_type: None,
                deprecated: false,
            }],
        );
        for name in ["Group", "User"] {
            model.types.insert(
                name.to_string(),
                Type {
                    name: name.to_string(),
                    kind: TypeKind::Standard,
                    description: None,
                    properties: Vec::new(),
                    enum_values: Vec::new(),
                },
            );
        }
        model
    }

    fn models(versions: &[&str]) -> StaticModels {
        let model = Arc::new(sample_model());
        StaticModels {
            models: versions
                .iter()
                .map(|v| (v.to_string(), model.clone()))
                .collect(),
            fatal: None,
            info: Some(VersionInfo {
                sdk_version: "21.18".to_string(),
                api_version: "4.0".to_string(),
            }),
        }
    }

    fn registry() -> CapabilityRegistry {
        let mut registry = CapabilityRegistry::empty();
        registry.register(Language::TypeScript, |settings| {
            Box::new(RecordingCapability::from_settings(Language::TypeScript, settings))
        });
        registry.register(Language::Python, |settings| {
            let mut capability = RecordingCapability::from_settings(Language::Python, settings);
            capability.multi_api = false;
            capability.streams = false;
            capability.constants = Some(settings.output_root.join("constants.py"));
            Box::new(capability)
        });
        registry
    }

    fn orchestrator(
        models: StaticModels,
        root: &Path,
        executor: Arc<MockCommandExecutor>,
    ) -> SdkOrchestrator {
        SdkOrchestrator::new(
            Arc::new(models),
            registry(),
            Arc::new(FileSystemOutputService::new()),
            FilesFormatter::new(executor),
            RunOptions::new(root),
        )
    }

    fn versions(list: &[&str]) -> Vec<String> {
        list.iter().map(|v| v.to_string()).collect()
    }

    #[traced_test]
    #[tokio::test]
    async fn test_single_api_language_only_generates_last_version() {
        let dir = tempdir().unwrap();
        let mut orchestrator = orchestrator(
            models(&["3.1", "4.0"]),
            dir.path(),
            Arc::new(MockCommandExecutor::new()),
        );

        let report = orchestrator
            .run(&[Language::Python], &versions(&["3.1", "4.0"]))
            .await
            .unwrap();

        assert!(!dir.path().join("python/3.1").exists());
        assert!(dir.path().join("python/4.0/methods.py").exists());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].api_version, "3.1");
        assert!(report.generated.iter().all(|p| p.starts_with(dir.path().join("python/4.0"))));
        assert!(logs_contain("supports a single API version"));
    }

    #[tokio::test]
    async fn test_generator_order_and_files_per_version() {
        let dir = tempdir().unwrap();
        let mut orchestrator = orchestrator(
            models(&["3.1", "4.0"]),
            dir.path(),
            Arc::new(MockCommandExecutor::new()),
        );

        let report = orchestrator
            .run(&[Language::TypeScript], &versions(&["3.1", "4.0"]))
            .await
            .unwrap();

        let names: Vec<_> = report
            .generated
            .iter()
            .filter(|p| p.starts_with(dir.path().join("typescript/4.0")))
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["funcs.ts", "methodsInterface.ts", "methods.ts", "streams.ts", "models.ts"]
        );
        assert_eq!(report.generated.len(), 10);
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn test_omit_streams_writes_no_stream_file() {
        let dir = tempdir().unwrap();
        let mut orchestrator = orchestrator(
            models(&["4.0"]),
            dir.path(),
            Arc::new(MockCommandExecutor::new()),
        );
        orchestrator.options.omit_streams = true;

        let report = orchestrator
            .run(&[Language::TypeScript], &versions(&["4.0"]))
            .await
            .unwrap();

        assert_eq!(report.generated.len(), 4);
        assert!(!dir.path().join("typescript/4.0/streams.ts").exists());
    }

    #[tokio::test]
    async fn test_missing_capability_does_not_stop_other_languages() {
        let dir = tempdir().unwrap();
        let mut orchestrator = orchestrator(
            models(&["4.0"]),
            dir.path(),
            Arc::new(MockCommandExecutor::new()),
        );

        let report = orchestrator
            .run(&[Language::Kotlin, Language::TypeScript], &versions(&["4.0"]))
            .await
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].language, Language::Kotlin);
        assert!(report.failures[0].api_version.is_none());
        assert!(dir.path().join("typescript/4.0/methods.ts").exists());
    }

    #[tokio::test]
    async fn test_model_failure_is_scoped_to_the_unit() {
        let dir = tempdir().unwrap();
        let mut orchestrator = orchestrator(
            models(&["4.0"]),
            dir.path(),
            Arc::new(MockCommandExecutor::new()),
        );

        let report = orchestrator
            .run(&[Language::TypeScript], &versions(&["3.1", "4.0"]))
            .await
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].api_version.as_deref(), Some("3.1"));
        assert!(dir.path().join("typescript/4.0/models.ts").exists());
    }

    #[tokio::test]
    async fn test_authentication_failure_aborts_run() {
        let dir = tempdir().unwrap();
        let mut models = models(&["4.0"]);
        models.fatal = Some("3.1".to_string());
        let mut orchestrator =
            orchestrator(models, dir.path(), Arc::new(MockCommandExecutor::new()));

        let result = orchestrator
            .run(&[Language::TypeScript], &versions(&["3.1", "4.0"]))
            .await;

        match result {
            Err(e) => assert!(e.is_run_fatal()),
            Ok(_) => panic!("Expected authentication failure"),
        }
        assert!(!dir.path().join("typescript/4.0").exists());
    }

    #[tokio::test]
    async fn test_ref_counts_do_not_leak_across_languages() {
        let dir = tempdir().unwrap();
        let mut orchestrator = orchestrator(
            models(&["4.0"]),
            dir.path(),
            Arc::new(MockCommandExecutor::new()),
        );

        orchestrator
            .run(&[Language::TypeScript, Language::Python], &versions(&["4.0"]))
            .await
            .unwrap();

        let ts = std::fs::read_to_string(dir.path().join("typescript/4.0/models.ts")).unwrap();
        let py = std::fs::read_to_string(dir.path().join("python/4.0/models.py")).unwrap();
        assert!(ts.contains("// 1 API models: 1 Spec, 0 Request, 0 Write, 0 Enum"));
        assert!(py.contains("// 1 API models: 1 Spec, 0 Request, 0 Write, 0 Enum"));
    }

    #[tokio::test]
    async fn test_version_stamp_uses_final_generated_version() {
        let dir = tempdir().unwrap();
        let constants = dir.path().join("constants.py");
        std::fs::write(&constants, "sdk_version = \"0\"\napi_version = \"0\"\n").unwrap();
        let mut orchestrator = orchestrator(
            models(&["3.1", "4.0"]),
            dir.path(),
            Arc::new(MockCommandExecutor::new()),
        );

        let report = orchestrator
            .run(&[Language::Python], &versions(&["4.0", "3.1"]))
            .await
            .unwrap();

        assert_eq!(report.stamped, vec![(Language::Python, "3.1".to_string())]);
        assert_eq!(
            std::fs::read_to_string(&constants).unwrap(),
            "sdk_version = \"21.18\"\napi_version = \"3.1\"\n"
        );
    }

    #[tokio::test]
    async fn test_no_stamp_when_nothing_generated() {
        let dir = tempdir().unwrap();
        let constants = dir.path().join("constants.py");
        std::fs::write(&constants, "api_version = \"0\"\n").unwrap();
        let mut orchestrator = orchestrator(
            models(&[]),
            dir.path(),
            Arc::new(MockCommandExecutor::new()),
        );

        let report = orchestrator
            .run(&[Language::Python], &versions(&["4.0"]))
            .await
            .unwrap();

        assert!(report.stamped.is_empty());
        assert_eq!(std::fs::read_to_string(&constants).unwrap(), "api_version = \"0\"\n");
    }

    #[tokio::test]
    async fn test_reformat_runs_once_after_all_languages() {
        let dir = tempdir().unwrap();
        let executor = Arc::new(
            MockCommandExecutor::new()
                .with_result("prettier", Ok(CommandOutput::default()))
                .with_result("black", Ok(CommandOutput::default())),
        );
        let mut orchestrator = orchestrator(models(&["3.1", "4.0"]), dir.path(), executor.clone());

        orchestrator
            .run(
                &[Language::TypeScript, Language::Python],
                &versions(&["3.1", "4.0"]),
            )
            .await
            .unwrap();

        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        let prettier = calls.iter().find(|c| c.program == "prettier").unwrap();
        // 5 files for each of the two versions
        assert_eq!(prettier.args.len(), 1 + 10);
        // single API language, last version only, no stream file
        let black = calls.iter().find(|c| c.program == "black").unwrap();
        assert_eq!(black.args.len(), 4);
    }
}
