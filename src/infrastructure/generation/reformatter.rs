//! Post-generation reformatting and version stamping
//!
//! Written files are bucketed by extension and handed to one external
//! formatter per extension in a single batched call. Constants files get
//! their version strings rewritten in place. Neither step ever fails the
//! run: missing tools and files are logged and skipped.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::generation::{Language, extension_key};
use crate::infrastructure::shell::{CommandExecutor, DEFAULT_TOOL_TIMEOUT, Invocation};
use crate::infrastructure::spec::VersionInfo;

/// Values written into a constants file
#[derive(Debug, Clone, Copy)]
pub struct StampContext<'a> {
    pub info: &'a VersionInfo,
    pub env_prefix: &'a str,
}

/// One substitution: the pattern's first group is kept, the quoted value
/// replaced, the second group (closing quote) kept
pub struct StampRule {
    pub pattern: &'static Regex,
    pub value: String,
}

impl StampRule {
    pub fn new(pattern: &'static Regex, value: impl Into<String>) -> Self {
        Self {
            pattern,
            value: value.into(),
        }
    }

    fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures| {
                format!("{}{}{}", &caps[1], self.value, &caps[2])
            })
            .into_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReformatOutcome {
    Formatted(usize),
    MissingBinary,
    Failed,
}

/// External formatter and stamping rules for one language
#[async_trait]
pub trait LanguageReformatter: Send + Sync {
    fn language(&self) -> Language;

    /// Lower-case extension this formatter handles, without the dot
    fn extension(&self) -> &'static str;

    fn binary(&self) -> &'static str;

    /// Arguments placed before the file list
    fn args(&self) -> Vec<String> {
        Vec::new()
    }

    fn install_hint(&self) -> &'static str;

    fn stamp_rules(&self, ctx: &StampContext<'_>) -> Vec<StampRule>;

    /// Format `paths` in one call, degrading to a warning on any failure
    async fn reformat(&self, executor: &dyn CommandExecutor, paths: &[PathBuf]) -> ReformatOutcome {
        if executor.locate(self.binary()).is_none() {
            warn!(
                binary = self.binary(),
                extension = self.extension(),
                hint = self.install_hint(),
                "Formatter not found, skipping reformat"
            );
            return ReformatOutcome::MissingBinary;
        }

        let invocation = Invocation::new(self.binary())
            .args(self.args())
            .args(paths.iter().map(|p| p.to_string_lossy().into_owned()))
            .timeout(DEFAULT_TOOL_TIMEOUT);

        match executor.run(&invocation).await {
            Ok(_) => {
                info!(
                    binary = self.binary(),
                    files = paths.len(),
                    "Reformatted generated files"
                );
                ReformatOutcome::Formatted(paths.len())
            }
            Err(failure) => {
                warn!(binary = self.binary(), error = %failure, "Reformat failed");
                ReformatOutcome::Failed
            }
        }
    }
}

static TS_SDK_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\bsdkVersion\s*=\s*['"])[^'"]*(['"])"#).expect("Invalid regex"));
static TS_API_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\bapiVersion\s*=\s*['"])[^'"]*(['"])"#).expect("Invalid regex"));
static TS_ENV_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\benvironmentPrefix\s*=\s*['"])[^'"]*(['"])"#).expect("Invalid regex"));

static PY_SDK_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\bsdk_version\s*=\s*['"])[^'"]*(['"])"#).expect("Invalid regex"));
static PY_API_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\bapi_version\s*=\s*['"])[^'"]*(['"])"#).expect("Invalid regex"));
static PY_ENV_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\benvironment_prefix\s*=\s*['"])[^'"]*(['"])"#).expect("Invalid regex"));

pub struct TypeScriptReformatter;

impl LanguageReformatter for TypeScriptReformatter {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn extension(&self) -> &'static str {
        "ts"
    }

    fn binary(&self) -> &'static str {
        "prettier"
    }

    fn args(&self) -> Vec<String> {
        vec!["--write".to_string()]
    }

    fn install_hint(&self) -> &'static str {
        "npm install -g prettier"
    }

    fn stamp_rules(&self, ctx: &StampContext<'_>) -> Vec<StampRule> {
        vec![
            StampRule::new(&TS_SDK_VERSION, &ctx.info.sdk_version),
            StampRule::new(&TS_API_VERSION, &ctx.info.api_version),
            StampRule::new(&TS_ENV_PREFIX, ctx.env_prefix),
        ]
    }
}

pub struct PythonReformatter;

impl LanguageReformatter for PythonReformatter {
    fn language(&self) -> Language {
        Language::Python
    }

    fn extension(&self) -> &'static str {
        "py"
    }

    fn binary(&self) -> &'static str {
        "black"
    }

    fn install_hint(&self) -> &'static str {
        "pip install black"
    }

    fn stamp_rules(&self, ctx: &StampContext<'_>) -> Vec<StampRule> {
        vec![
            StampRule::new(&PY_SDK_VERSION, &ctx.info.sdk_version),
            StampRule::new(&PY_API_VERSION, &ctx.info.api_version),
            StampRule::new(&PY_ENV_PREFIX, ctx.env_prefix),
        ]
    }
}

/// Collects generated files and runs the registered reformatters over them
pub struct FilesFormatter {
    executor: Arc<dyn CommandExecutor>,
    reformatters: Vec<Box<dyn LanguageReformatter>>,
    files: BTreeMap<String, BTreeSet<PathBuf>>,
}

impl FilesFormatter {
    /// Formatter with the TypeScript and Python reformatters registered
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self::empty(executor)
            .with_reformatter(Box::new(TypeScriptReformatter))
            .with_reformatter(Box::new(PythonReformatter))
    }

    pub fn empty(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            reformatters: Vec::new(),
            files: BTreeMap::new(),
        }
    }

    pub fn with_reformatter(mut self, reformatter: Box<dyn LanguageReformatter>) -> Self {
        self.reformatters.push(reformatter);
        self
    }

    /// Register a written file. Adding the same path twice is a no-op.
    pub fn add_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        let key = extension_key(&path);
        self.files.entry(key).or_default().insert(path);
    }

    pub fn files(&self) -> &BTreeMap<String, BTreeSet<PathBuf>> {
        &self.files
    }

    fn for_extension(&self, extension: &str) -> Option<&dyn LanguageReformatter> {
        self.reformatters
            .iter()
            .find(|r| r.extension() == extension)
            .map(|r| r.as_ref())
    }

    fn for_language(&self, language: Language) -> Option<&dyn LanguageReformatter> {
        self.reformatters
            .iter()
            .find(|r| r.language() == language)
            .map(|r| r.as_ref())
    }

    /// Run one formatter call per extension bucket
    pub async fn reformat_all(&self) -> BTreeMap<String, ReformatOutcome> {
        let mut outcomes = BTreeMap::new();
        for (extension, paths) in &self.files {
            let Some(reformatter) = self.for_extension(extension) else {
                warn!(extension = %extension, files = paths.len(), "No formatter registered for extension");
                continue;
            };
            let paths: Vec<PathBuf> = paths.iter().cloned().collect();
            let outcome = reformatter.reformat(self.executor.as_ref(), &paths).await;
            outcomes.insert(extension.clone(), outcome);
        }
        outcomes
    }

    /// Rewrite the version constants of `language`'s constants file.
    ///
    /// Returns whether the file was rewritten.
    pub async fn version_stamp(
        &self,
        language: Language,
        constants_file: Option<&Path>,
        info: Option<&VersionInfo>,
        env_prefix: &str,
    ) -> bool {
        let Some(info) = info else {
            warn!(language = %language, "Version information unavailable, skipping version stamp");
            return false;
        };
        let Some(reformatter) = self.for_language(language) else {
            debug!(language = %language, "No version stamp rules registered");
            return false;
        };
        let Some(path) = constants_file else {
            warn!(language = %language, "No constants file declared, skipping version stamp");
            return false;
        };

        let original = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    language = %language,
                    path = %path.display(),
                    error = %e,
                    "Constants file not found, skipping version stamp"
                );
                return false;
            }
        };

        let ctx = StampContext { info, env_prefix };
        let stamped = reformatter
            .stamp_rules(&ctx)
            .iter()
            .fold(original, |text, rule| rule.apply(&text));

        match tokio::fs::write(path, stamped).await {
            Ok(()) => {
                info!(
                    language = %language,
                    path = %path.display(),
                    sdk_version = %info.sdk_version,
                    api_version = %info.api_version,
                    "Stamped SDK version"
                );
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to write stamped constants file");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::shell::{CommandOutput, MockCommandExecutor, ToolFailure};
    use tempfile::tempdir;
    use tracing_test::traced_test;

    fn info() -> VersionInfo {
        VersionInfo {
            sdk_version: "21.18".to_string(),
            api_version: "4.0".to_string(),
        }
    }

    #[test]
    fn test_add_file_buckets_by_extension_once() {
        let mut formatter = FilesFormatter::new(Arc::new(MockCommandExecutor::new()));
        formatter.add_file("sdk/a.ts");
        formatter.add_file("sdk/a.ts");
        formatter.add_file("sdk/B.TS");
        formatter.add_file("sdk/c.py");

        assert_eq!(formatter.files()["ts"].len(), 2);
        assert_eq!(formatter.files()["py"].len(), 1);
    }

    #[tokio::test]
    async fn test_reformat_batches_one_call_per_extension() {
        let executor = Arc::new(
            MockCommandExecutor::new().with_result("prettier", Ok(CommandOutput::default())),
        );
        let mut formatter = FilesFormatter::new(executor.clone());
        formatter.add_file("out/methods.ts");
        formatter.add_file("out/models.ts");

        let outcomes = formatter.reformat_all().await;

        assert_eq!(outcomes["ts"], ReformatOutcome::Formatted(2));
        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args, vec!["--write", "out/methods.ts", "out/models.ts"]);
    }

    #[tokio::test]
    async fn test_unregistered_extension_leaves_files_untouched() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("Methods.kt");
        std::fs::write(&file, "fun   me( ) {}\n").unwrap();
        let executor = Arc::new(MockCommandExecutor::new());
        let mut formatter = FilesFormatter::new(executor.clone());
        formatter.add_file(&file);

        let outcomes = formatter.reformat_all().await;

        assert!(outcomes.is_empty());
        assert!(executor.calls().is_empty());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "fun   me( ) {}\n");
    }

    #[traced_test]
    #[tokio::test]
    async fn test_missing_binary_warns_and_skips() {
        let executor = Arc::new(MockCommandExecutor::new());
        let mut formatter = FilesFormatter::new(executor.clone());
        formatter.add_file("out/methods.py");

        let outcomes = formatter.reformat_all().await;

        assert_eq!(outcomes["py"], ReformatOutcome::MissingBinary);
        assert!(executor.calls().is_empty());
        assert!(logs_contain("Formatter not found"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_tool_failure_is_not_fatal() {
        let executor = Arc::new(MockCommandExecutor::new().with_result(
            "black",
            Err(ToolFailure::NonZeroExit {
                program: "black".to_string(),
                code: 123,
                stderr: "cannot parse".to_string(),
            }),
        ));
        let mut formatter = FilesFormatter::new(executor);
        formatter.add_file("out/methods.py");

        let outcomes = formatter.reformat_all().await;

        assert_eq!(outcomes["py"], ReformatOutcome::Failed);
        assert!(logs_contain("Reformat failed"));
    }

    #[tokio::test]
    async fn test_version_stamp_rewrites_typescript_constants() {
        let dir = tempdir().unwrap();
        let constants = dir.path().join("constants.ts");
        std::fs::write(
            &constants,
            "export const sdkVersion = '0.0'\nexport const apiVersion = \"3.1\"\nexport const environmentPrefix = 'X'\nexport const other = '1'\n",
        )
        .unwrap();
        let formatter = FilesFormatter::new(Arc::new(MockCommandExecutor::new()));

        let stamped = formatter
            .version_stamp(Language::TypeScript, Some(constants.as_path()), Some(&info()), "LOOKERSDK")
            .await;

        assert!(stamped);
        assert_eq!(
            std::fs::read_to_string(&constants).unwrap(),
            "export const sdkVersion = '21.18'\nexport const apiVersion = \"4.0\"\nexport const environmentPrefix = 'LOOKERSDK'\nexport const other = '1'\n"
        );
    }

    #[tokio::test]
    async fn test_version_stamp_rewrites_python_constants() {
        let dir = tempdir().unwrap();
        let constants = dir.path().join("constants.py");
        std::fs::write(&constants, "sdk_version = \"0.0\"\napi_version = \"3.1\"\n").unwrap();
        let formatter = FilesFormatter::new(Arc::new(MockCommandExecutor::new()));

        assert!(
            formatter
                .version_stamp(Language::Python, Some(constants.as_path()), Some(&info()), "LOOKERSDK")
                .await
        );
        assert_eq!(
            std::fs::read_to_string(&constants).unwrap(),
            "sdk_version = \"21.18\"\napi_version = \"4.0\"\n"
        );
    }

    #[tokio::test]
    async fn test_version_stamp_leaves_similarly_named_constants() {
        let dir = tempdir().unwrap();
        let constants = dir.path().join("constants.py");
        std::fs::write(
            &constants,
            "min_sdk_version = \"1.0\"\nsdk_version = \"0.0\"\ndefault_api_version = \"3.1\"\napi_version = \"3.1\"\n",
        )
        .unwrap();
        let formatter = FilesFormatter::new(Arc::new(MockCommandExecutor::new()));

        assert!(
            formatter
                .version_stamp(Language::Python, Some(constants.as_path()), Some(&info()), "LOOKERSDK")
                .await
        );
        assert_eq!(
            std::fs::read_to_string(&constants).unwrap(),
            "min_sdk_version = \"1.0\"\nsdk_version = \"21.18\"\ndefault_api_version = \"3.1\"\napi_version = \"4.0\"\n"
        );
    }

    #[traced_test]
    #[tokio::test]
    async fn test_version_stamp_missing_constants_file_warns() {
        let dir = tempdir().unwrap();
        let formatter = FilesFormatter::new(Arc::new(MockCommandExecutor::new()));

        let stamped = formatter
            .version_stamp(
                Language::TypeScript,
                Some(dir.path().join("missing.ts").as_path()),
                Some(&info()),
                "LOOKERSDK",
            )
            .await;

        assert!(!stamped);
        assert!(logs_contain("Constants file not found"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_version_stamp_without_info_warns() {
        let formatter = FilesFormatter::new(Arc::new(MockCommandExecutor::new()));

        let stamped = formatter
            .version_stamp(Language::Python, Some(Path::new("constants.py")), None, "LOOKERSDK")
            .await;

        assert!(!stamped);
        assert!(logs_contain("Version information unavailable"));
    }
}
