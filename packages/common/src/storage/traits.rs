use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Storage for user-uploaded media files.
///
/// Files are addressed by a path relative to the store root, e.g.
/// `uploads/recipe/6f0c...e1.png`. The store picks the file name; callers only
/// choose the directory and the extension.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store bytes under `dir` with a freshly generated unique file name and
    /// return the relative path of the new file.
    async fn put(
        &self,
        dir: &str,
        extension: Option<&str>,
        data: &[u8],
    ) -> Result<String, StorageError>;

    /// Retrieve a file as a streaming async reader.
    async fn get_stream(&self, path: &str) -> Result<BoxReader, StorageError>;

    /// Retrieve all bytes of a file.
    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(path).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Delete a file.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;
}
