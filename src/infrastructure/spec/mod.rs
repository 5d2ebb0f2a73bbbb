//! Schema acquisition pipeline: manifest, fetch, conversion and parsing

pub mod converter;
pub mod errors;
pub mod http_loader;
pub mod model_loader;
pub mod parser;
pub mod resolver;

pub use converter::{SchemaConverter, SchemaDialect, upgrade_spec};
pub use errors::SpecError;
pub use http_loader::AuthenticatedReader;
pub use model_loader::{ModelLoader, ResolvedModels};
pub use parser::ApiModelParser;
pub use resolver::{
    SchemaHandle, SchemaLocation, SpecResolver, VersionEntry, VersionInfo, VersionsManifest,
    fetch_versions_manifest, load_versions_file, select_version,
};
