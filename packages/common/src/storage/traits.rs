use async_trait::async_trait;

use super::error::StorageError;

/// Path-addressed media storage.
///
/// Paths are relative, `/`-separated keys chosen by the caller
/// (e.g. `previews/9f3c....png`). The same key always refers to the
/// same file until it is deleted or overwritten.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store bytes under the given path, overwriting any existing file.
    async fn put(&self, path: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Retrieve all bytes stored under the given path.
    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Check whether a file exists at the given path.
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Delete the file at the given path.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;

    /// Get the size of a stored file in bytes.
    async fn size(&self, path: &str) -> Result<u64, StorageError>;
}
