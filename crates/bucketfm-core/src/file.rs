//! Single-file operations: upload, delete and download links.

use std::sync::Arc;

use url::Url;

use crate::error::{CoreError, CoreResult};
use crate::path::{ensure_depth, NsPath};
use crate::store::ObjectStore;

/// File operations against an [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct FileOps {
    store: Arc<dyn ObjectStore>,
}

impl FileOps {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Stores `bytes` as the file `name` in the folder at `path`.
    ///
    /// An existing file of the same name is replaced. Size and content type
    /// are not checked here; the store enforces whatever limits it has.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidSegment`] if `name` is empty, reserved, or contains `/`.
    /// - [`CoreError::DepthExceeded`] if `path` is nested too deep.
    /// - [`CoreError::UploadFailed`] if the store write fails.
    pub async fn upload(&self, path: &NsPath, name: &str, bytes: &[u8]) -> CoreResult<String> {
        let key = file_key(path, name)?;
        self.store.put(&key, bytes).await.map_err(|source| {
            tracing::warn!(key = %key, error = %source, "upload failed");
            CoreError::UploadFailed {
                key: key.clone(),
                source,
            }
        })?;
        tracing::info!(key = %key, size = bytes.len(), "file uploaded");
        Ok(key)
    }

    /// Deletes the file `name` from the folder at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidSegment`] if `name` is not a valid segment.
    /// - [`CoreError::DeleteFailed`] if the store delete fails. A missing file
    ///   is reported this way too; check [`CoreError::is_not_found`].
    pub async fn delete_file(&self, path: &NsPath, name: &str) -> CoreResult<()> {
        let key = path.join(name)?.to_string();
        self.store.delete(&key).await.map_err(|source| {
            tracing::warn!(key = %key, error = %source, "file delete failed");
            CoreError::DeleteFailed {
                key: key.clone(),
                source,
            }
        })?;
        tracing::info!(key = %key, "file deleted");
        Ok(())
    }

    /// Returns a URL to open the file `name` in the folder at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidSegment`] if `name` is not a valid segment.
    /// - [`CoreError::UrlUnavailable`] if the store cannot produce a URL,
    ///   for example because the file does not exist.
    pub async fn preview_url(&self, path: &NsPath, name: &str) -> CoreResult<Url> {
        self.download_url(path, name).await
    }

    /// Returns a URL to share the file `name` in the folder at `path`.
    ///
    /// Identical to [`FileOps::preview_url`]; handing the link to a clipboard
    /// or display is up to the caller.
    ///
    /// # Errors
    ///
    /// Same as [`FileOps::preview_url`].
    pub async fn share_url(&self, path: &NsPath, name: &str) -> CoreResult<Url> {
        self.download_url(path, name).await
    }

    async fn download_url(&self, path: &NsPath, name: &str) -> CoreResult<Url> {
        let key = path.join(name)?.to_string();
        self.store.download_url(&key).await.map_err(|source| {
            tracing::warn!(key = %key, error = %source, "download URL unavailable");
            CoreError::UrlUnavailable { key, source }
        })
    }
}

fn file_key(path: &NsPath, name: &str) -> CoreResult<String> {
    ensure_depth(path)?;
    Ok(path.join(name)?.to_string())
}
