use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::error::StorageError;
use super::traits::MediaStore;

/// Filesystem-backed media store.
///
/// Files live under `{root}/{path}`; writes go through a temp file in
/// `{root}/.tmp` and are moved into place with a rename, so readers
/// never observe a partially written file.
pub struct FilesystemMediaStore {
    root: PathBuf,
    max_size: u64,
}

impl FilesystemMediaStore {
    /// Create a new filesystem media store rooted at `root`.
    pub async fn new(root: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self { root, max_size })
    }

    /// Resolve a storage key to a filesystem path, rejecting keys that
    /// are empty, absolute, or contain `..` components.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        if path.is_empty() {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        let rel = Path::new(path);
        let safe = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(rel))
    }

    fn temp_path(&self) -> PathBuf {
        self.root.join(".tmp").join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl MediaStore for FilesystemMediaStore {
    async fn put(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let dest = self.resolve(path)?;
        let temp_path = self.temp_path();

        let mut temp_file = fs::File::create(&temp_path).await?;
        if let Err(e) = temp_file.write_all(data).await {
            drop(temp_file);
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        temp_file.flush().await?;
        drop(temp_file);

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &dest).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!("Stored {} ({} bytes)", path, data.len());
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let dest = self.resolve(path)?;
        match fs::read(&dest).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let dest = self.resolve(path)?;
        Ok(fs::try_exists(&dest).await?)
    }

    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        let dest = self.resolve(path)?;
        match fs::remove_file(&dest).await {
            Ok(()) => {
                tracing::debug!("Deleted {}", path);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, path: &str) -> Result<u64, StorageError> {
        let dest = self.resolve(path)?;
        match fs::metadata(&dest).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
