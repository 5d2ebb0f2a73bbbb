//! Output service implementations

pub mod filesystem_output;

pub use filesystem_output::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{GeneratedFile, OutputService};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_file_creates_parents() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output_service = FileSystemOutputService::new();
        let path = temp_dir.path().join("typescript/sdk/src/40/methods.ts");

        output_service
            .write_file(&GeneratedFile::new(path.clone(), "export {}\n"))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "export {}\n");
    }

    #[tokio::test]
    async fn test_write_file_overwrites() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output_service = FileSystemOutputService::new();
        let path = temp_dir.path().join("models.py");
        std::fs::write(&path, "old content that is longer").unwrap();

        output_service
            .write_file(&GeneratedFile::new(path.clone(), "new"))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_ensure_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output_service = FileSystemOutputService::new();
        let nested_path = temp_dir.path().join("deeply/nested/directory");

        output_service.ensure_directory(&nested_path).await.unwrap();

        assert!(nested_path.is_dir());
    }
}
