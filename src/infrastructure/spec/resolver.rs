//! Versions manifest handling and per-version schema resolution

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

use crate::core::SdkConfig;
use crate::infrastructure::spec::{AuthenticatedReader, SchemaConverter, SpecError};
use crate::model::ApiModel;

/// Default file-name stem of cached schemas
pub const DEFAULT_SCHEMA_NAME: &str = "Looker";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: String,
    #[serde(default)]
    pub full_version: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    pub swagger_url: String,
}

/// Known API versions as published by the server's `/versions` endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionsManifest {
    #[serde(default)]
    pub looker_release_version: Option<String>,
    #[serde(default)]
    pub current_version: Option<VersionEntry>,
    #[serde(default)]
    pub supported_versions: Vec<VersionEntry>,
    #[serde(default)]
    pub api_server_url: Option<String>,
}

/// Version metadata stamped into generated constants files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// `major.minor` of the server release
    pub sdk_version: String,
    pub api_version: String,
}

impl VersionsManifest {
    pub fn from_json(text: &str) -> Result<Self, SpecError> {
        serde_json::from_str(text)
            .map_err(|e| SpecError::Parse(format!("Invalid versions manifest: {e}")))
    }

    /// Release and current API version, when the manifest carries a release
    pub fn version_info(&self) -> Option<VersionInfo> {
        let release = self.looker_release_version.as_deref()?;
        let sdk_version = release.split('.').take(2).collect::<Vec<_>>().join(".");
        let api_version = self
            .current_version
            .as_ref()
            .or_else(|| self.supported_versions.last())
            .map(|entry| entry.version.clone())
            .unwrap_or_default();
        Some(VersionInfo {
            sdk_version,
            api_version,
        })
    }
}

/// Look up `tag` among the supported versions
pub fn select_version<'a>(tag: &str, manifest: &'a VersionsManifest) -> Option<&'a VersionEntry> {
    manifest.supported_versions.iter().find(|v| v.version == tag)
}

/// Fetch `{base_url}/versions` through the login-on-demand reader
pub async fn fetch_versions_manifest(
    reader: &AuthenticatedReader,
    config: &SdkConfig,
) -> Result<VersionsManifest, SpecError> {
    let base = config
        .require_base_url()
        .map_err(|e| SpecError::Config(e.to_string()))?;
    let url = format!("{}/versions", base.as_str().trim_end_matches('/'));
    info!(url = %url, "Fetching versions manifest");
    let body = reader.read(&url).await?;
    VersionsManifest::from_json(&body)
}

/// Read a manifest payload from disk instead of the server
pub async fn load_versions_file(path: &Path) -> Result<VersionsManifest, SpecError> {
    let text = fs::read_to_string(path).await?;
    VersionsManifest::from_json(&text)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaLocation {
    Remote(Url),
    File(PathBuf),
}

impl SchemaLocation {
    /// Interpret a manifest `swagger_url`.
    ///
    /// `file:` URLs and bare paths are local. Server-relative paths are
    /// joined onto `base`.
    pub fn parse(raw: &str, base: Option<&Url>) -> Result<Self, SpecError> {
        if let Some(rest) = raw.strip_prefix("file:") {
            let path = rest.strip_prefix("//").unwrap_or(rest);
            return Ok(SchemaLocation::File(PathBuf::from(path)));
        }
        if let Ok(url) = Url::parse(raw) {
            return Ok(SchemaLocation::Remote(url));
        }
        match base {
            Some(base) if raw.starts_with('/') => base
                .join(raw)
                .map(SchemaLocation::Remote)
                .map_err(|e| SpecError::Config(format!("Invalid schema url '{raw}': {e}"))),
            _ => Ok(SchemaLocation::File(PathBuf::from(raw))),
        }
    }
}

/// One API version's schema plus its lazily parsed model
#[derive(Debug)]
pub struct SchemaHandle {
    pub version: String,
    pub name: String,
    pub location: SchemaLocation,
    pub(crate) model: OnceCell<Arc<ApiModel>>,
}

impl SchemaHandle {
    pub fn new(version: impl Into<String>, name: impl Into<String>, location: SchemaLocation) -> Self {
        Self {
            version: version.into(),
            name: name.into(),
            location,
            model: OnceCell::new(),
        }
    }

    /// Model if it has been loaded already
    pub fn model(&self) -> Option<&Arc<ApiModel>> {
        self.model.get()
    }
}

/// Turns version tags into converted, cached schema handles
pub struct SpecResolver {
    manifest: VersionsManifest,
    reader: Arc<AuthenticatedReader>,
    converter: SchemaConverter,
    spec_dir: PathBuf,
    name: String,
    base_url: Option<Url>,
    force: bool,
    handles: Mutex<HashMap<String, Arc<SchemaHandle>>>,
}

impl SpecResolver {
    pub fn new(
        manifest: VersionsManifest,
        reader: Arc<AuthenticatedReader>,
        converter: SchemaConverter,
        spec_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            manifest,
            reader,
            converter,
            spec_dir: spec_dir.into(),
            name: DEFAULT_SCHEMA_NAME.to_string(),
            base_url: None,
            force: false,
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_base_url(mut self, base_url: Option<Url>) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn manifest(&self) -> &VersionsManifest {
        &self.manifest
    }

    pub fn raw_path(&self, version: &str) -> PathBuf {
        self.spec_dir.join(format!("{}.{version}.json", self.name))
    }

    pub fn converted_path(&self, version: &str) -> PathBuf {
        self.spec_dir.join(format!("{}.{version}.oas.json", self.name))
    }

    /// Handle for `version`, fetching and converting its schema on first use
    pub async fn resolve(&self, version: &str) -> Result<Arc<SchemaHandle>, SpecError> {
        if let Some(handle) = self.cached(version) {
            return Ok(handle);
        }

        let entry = select_version(version, &self.manifest)
            .ok_or_else(|| SpecError::VersionNotFound(version.to_string()))?;

        let source = match SchemaLocation::parse(&entry.swagger_url, self.base_url.as_ref())? {
            SchemaLocation::File(path) => path,
            SchemaLocation::Remote(url) => {
                let raw = self.raw_path(version);
                if self.force || !fs::try_exists(&raw).await? {
                    info!(version = %version, url = %url, "Fetching API schema");
                    let body = self.reader.read(url.as_str()).await?;
                    fs::create_dir_all(&self.spec_dir).await?;
                    fs::write(&raw, body).await?;
                } else {
                    debug!(path = %raw.display(), "Using cached API schema");
                }
                raw
            }
        };

        let converted = self
            .converter
            .convert(&source, &self.converted_path(version), self.force)
            .await?;

        let handle = Arc::new(SchemaHandle::new(
            version,
            self.name.clone(),
            SchemaLocation::File(converted),
        ));
        if let Ok(mut handles) = self.handles.lock() {
            handles.insert(version.to_string(), handle.clone());
        }
        Ok(handle)
    }

    fn cached(&self, version: &str) -> Option<Arc<SchemaHandle>> {
        self.handles
            .lock()
            .ok()
            .and_then(|handles| handles.get(version).cloned())
    }
}
