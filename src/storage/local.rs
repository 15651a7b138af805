use std::path::{Component, Path, PathBuf};

use tokio::fs;

use super::DocumentStorage;
use crate::error::{AppError, AppResult};

/// Documents stored as files in one directory.
#[derive(Debug, Clone)]
pub struct LocalDiskStorage {
    base_path: PathBuf,
}

impl LocalDiskStorage {
    pub async fn new(base_path: PathBuf) -> AppResult<Self> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to create upload directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;
        tracing::info!(path = %base_path.display(), "Document storage initialized");
        Ok(Self { base_path })
    }

    /// Resolves `name` inside the base directory, refusing anything that is
    /// not a single plain path component.
    fn path_for(&self, name: &str) -> AppResult<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(file)), None) => Ok(self.base_path.join(file)),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid document name: {}",
                name
            ))),
        }
    }
}

#[async_trait::async_trait]
impl DocumentStorage for LocalDiskStorage {
    async fn save(&self, name: &str, data: &[u8]) -> AppResult<String> {
        let path = self.path_for(name)?;
        fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", name, e)))?;
        tracing::debug!(name, size = data.len(), "Stored document");
        Ok(path.to_string_lossy().into_owned())
    }

    async fn read(&self, name: &str) -> AppResult<Option<Vec<u8>>> {
        let path = self.path_for(name)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!("Failed to read {}: {}", name, e))),
        }
    }

    async fn delete(&self, name: &str) -> AppResult<bool> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(name, "Deleted document");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::Storage(format!("Failed to delete {}: {}", name, e))),
        }
    }
}
