//! Filesystem-based output service

use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::generation::{GeneratedFile, GenerationError, OutputService};

/// Writes generated sources to disk, creating parent directories
pub struct FileSystemOutputService;

impl FileSystemOutputService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileSystemOutputService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputService for FileSystemOutputService {
    async fn write_file(&self, file: &GeneratedFile) -> Result<(), GenerationError> {
        if let Some(parent) = file.path.parent() {
            self.ensure_directory(parent).await?;
        }

        let mut handle = fs::File::create(&file.path).await.map_err(|e| {
            GenerationError::OutputError(format!(
                "Failed to create file {}: {e}",
                file.path.display()
            ))
        })?;
        handle
            .write_all(file.content.as_bytes())
            .await
            .map_err(|e| {
                GenerationError::OutputError(format!(
                    "Failed to write file {}: {e}",
                    file.path.display()
                ))
            })?;
        handle.flush().await.map_err(|e| {
            GenerationError::OutputError(format!(
                "Failed to flush file {}: {e}",
                file.path.display()
            ))
        })?;

        tracing::debug!(path = %file.path.display(), bytes = file.content.len(), "Wrote generated file");
        Ok(())
    }

    async fn ensure_directory(&self, path: &Path) -> Result<(), GenerationError> {
        if path.as_os_str().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(path).await.map_err(|e| {
            GenerationError::OutputError(format!(
                "Failed to create directory {}: {e}",
                path.display()
            ))
        })
    }
}
