//! sdk-codegen CLI entrypoint
//! Parses command-line arguments, wires the pipeline and runs the generator.
#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use sdk_codegen::core::SdkConfig;
use sdk_codegen::core::config::DEFAULT_ENV_PREFIX;
use sdk_codegen::generation::{RunOptions, RunReport, SdkOrchestrator, resolve_languages};
use sdk_codegen::infrastructure::ProcessExecutor;
use sdk_codegen::infrastructure::generation::{CapabilityRegistry, FilesFormatter};
use sdk_codegen::infrastructure::output::FileSystemOutputService;
use sdk_codegen::infrastructure::spec::{
    AuthenticatedReader, ModelLoader, ResolvedModels, SchemaConverter, SpecResolver,
    VersionsManifest, fetch_versions_manifest, load_versions_file,
};

#[derive(Parser, Debug)]
#[command(name = "sdk-codegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Comma-separated target languages, or "all"
    #[arg(default_value = "all")]
    languages: String,
    /// Local versions manifest used instead of fetching `{base_url}/versions`
    #[arg(short = 'v', long = "versions")]
    versions: Option<PathBuf>,
    /// INI configuration file
    #[arg(short = 'c', long = "config", default_value = "looker.ini")]
    config: PathBuf,
    /// Additional KEY=VALUE override file
    #[arg(long)]
    env_file: Option<PathBuf>,
    /// Root directory for generated SDK sources
    #[arg(short = 'o', long = "output", default_value = ".")]
    output: PathBuf,
    /// Directory caching fetched and converted schemas
    #[arg(long, default_value = "spec")]
    spec_dir: PathBuf,
    /// Re-fetch and re-convert cached schemas
    #[arg(long)]
    force: bool,
    /// Skip streaming method output
    #[arg(long)]
    no_streams: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let report = match generate(&cli).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, details = ?e, "Generation aborted");
            return Err(e);
        }
    };

    info!(
        files = report.generated.len(),
        skipped = report.skipped.len(),
        failures = report.failures.len(),
        "Generation finished"
    );
    if report.has_failures() {
        for failure in &report.failures {
            error!(
                language = %failure.language,
                version = failure.api_version.as_deref().unwrap_or("-"),
                error = %failure.error,
                "Unit failed"
            );
        }
        anyhow::bail!("{} generation unit(s) failed", report.failures.len());
    }
    Ok(())
}

async fn generate(cli: &Cli) -> anyhow::Result<RunReport> {
    let config = SdkConfig::load(&cli.config, cli.env_file.as_deref(), DEFAULT_ENV_PREFIX)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let reader = Arc::new(
        AuthenticatedReader::new(&config).context("Failed to build HTTP client")?,
    );

    let manifest = load_manifest(cli.versions.as_deref(), &reader, &config).await?;
    if manifest.version_info().is_none() {
        warn!("Versions manifest has no release version, constants will not be stamped");
    }

    let executor = Arc::new(ProcessExecutor::new());
    let resolver = SpecResolver::new(
        manifest,
        reader.clone(),
        SchemaConverter::new(executor.clone()),
        &cli.spec_dir,
    )
    .with_base_url(config.base_url.clone())
    .with_force(cli.force);
    let models = ResolvedModels::new(resolver, ModelLoader::new(reader));

    let registry = CapabilityRegistry::new();
    let languages = resolve_languages(&cli.languages, &registry.supported_languages());
    info!(
        languages = ?languages,
        versions = ?config.api_versions,
        "Generating SDK sources"
    );

    let mut options = RunOptions::new(&cli.output);
    options.env_prefix = config.env_prefix.clone();
    options.omit_streams = cli.no_streams;

    let mut orchestrator = SdkOrchestrator::new(
        Arc::new(models),
        registry,
        Arc::new(FileSystemOutputService::new()),
        FilesFormatter::new(executor),
        options,
    );
    let report = orchestrator
        .run(&languages, &config.api_versions)
        .await
        .context("SDK generation failed")?;
    Ok(report)
}

async fn load_manifest(
    versions_file: Option<&Path>,
    reader: &AuthenticatedReader,
    config: &SdkConfig,
) -> anyhow::Result<VersionsManifest> {
    match versions_file {
        Some(path) => load_versions_file(path)
            .await
            .with_context(|| format!("Failed to read versions file {}", path.display())),
        None => fetch_versions_manifest(reader, config)
            .await
            .context("Failed to fetch versions manifest"),
    }
}
