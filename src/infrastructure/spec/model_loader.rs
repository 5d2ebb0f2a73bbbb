//! Loads a schema handle's source into a shared [`ApiModel`]

use async_trait::async_trait;
use std::sync::Arc;
use tokio::fs;

use crate::generation::ModelSource;
use crate::infrastructure::spec::{
    ApiModelParser, AuthenticatedReader, SchemaHandle, SchemaLocation, SpecError, SpecResolver,
    VersionInfo,
};
use crate::model::ApiModel;

/// Reads local schemas directly and remote ones through the
/// login-on-demand reader
pub struct ModelLoader {
    reader: Arc<AuthenticatedReader>,
}

impl ModelLoader {
    pub fn new(reader: Arc<AuthenticatedReader>) -> Self {
        Self { reader }
    }

    /// Parsed model for `handle`. Parsing happens once per handle.
    pub async fn load(&self, handle: &SchemaHandle) -> Result<Arc<ApiModel>, SpecError> {
        let model = handle
            .model
            .get_or_try_init(|| async {
                let text = match &handle.location {
                    SchemaLocation::File(path) => {
                        tracing::debug!(path = %path.display(), "Loading API model from file");
                        fs::read_to_string(path).await?
                    }
                    SchemaLocation::Remote(url) => {
                        tracing::debug!(url = %url, "Loading API model from server");
                        self.reader.read(url.as_str()).await?
                    }
                };
                let model = ApiModelParser::from_text(&text)?.parse()?;
                tracing::info!(
                    version = %handle.version,
                    methods = model.method_count(),
                    "Loaded API model"
                );
                Ok::<_, SpecError>(Arc::new(model))
            })
            .await?;
        Ok(model.clone())
    }
}

/// Resolver and loader combined: version tag in, shared model out
pub struct ResolvedModels {
    resolver: SpecResolver,
    loader: ModelLoader,
}

impl ResolvedModels {
    pub fn new(resolver: SpecResolver, loader: ModelLoader) -> Self {
        Self { resolver, loader }
    }
}

#[async_trait]
impl ModelSource for ResolvedModels {
    async fn model(&self, api_version: &str) -> Result<Arc<ApiModel>, SpecError> {
        let handle = self.resolver.resolve(api_version).await?;
        self.loader.load(&handle).await
    }

    fn version_info(&self) -> Option<VersionInfo> {
        self.resolver.manifest().version_info()
    }
}
