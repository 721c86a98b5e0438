//! Book cover image storage.
//!
//! Covers are stored as `<isbn><ext>` and referenced by the public path
//! `<prefix>/<isbn><ext>`, which the router serves from the same directory.
//! A stored cover is never overwritten: a second upload for the same name
//! fails with [`ImageError::AlreadyExists`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use bookstore_core::Isbn;

/// File extensions accepted for cover images.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Errors from image storage.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The upload is empty.
    #[error("image upload is empty")]
    Empty,

    /// The file name has no recognised image extension.
    #[error("unsupported image type: {0:?}")]
    UnsupportedType(String),

    /// A cover with this name is already stored.
    #[error("image {0:?} already exists")]
    AlreadyExists(String),

    /// Writing the file failed.
    #[error("failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

/// Where cover images go.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Save `bytes` as the cover for `isbn` and return its public reference.
    async fn store(
        &self,
        isbn: &Isbn,
        original_file_name: &str,
        bytes: &[u8],
    ) -> Result<String, ImageError>;

    /// Delete the cover behind a reference returned by [`ImageStore::store`].
    /// Removing a cover that is already gone succeeds.
    async fn remove(&self, reference: &str) -> Result<(), ImageError>;
}

/// Lowercased extension of `file_name` with a leading dot, if it is allowed.
///
/// # Errors
///
/// Returns `ImageError::UnsupportedType` for a missing or unknown extension.
pub fn image_extension(file_name: &str) -> Result<String, ImageError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
        .ok_or_else(|| ImageError::UnsupportedType(file_name.to_owned()))?;
    Ok(format!(".{ext}"))
}

/// File name component of an image reference. Anything else in the
/// reference is ignored so it cannot point outside the image directory.
fn reference_file_name(reference: &str) -> Option<&str> {
    Path::new(reference).file_name().and_then(|name| name.to_str())
}

/// Images written to a local directory.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    dir: PathBuf,
    url_prefix: String,
}

impl LocalImageStore {
    /// Store files under `dir`, referenced as `<url_prefix>/<file>`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into(),
        }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(
        &self,
        isbn: &Isbn,
        original_file_name: &str,
        bytes: &[u8],
    ) -> Result<String, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        let file_name = format!("{isbn}{}", image_extension(original_file_name)?);

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&file_name);
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(ImageError::AlreadyExists(file_name));
            }
            Err(e) => return Err(e.into()),
        };

        let written = async {
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            // Don't leave a truncated cover behind.
            drop(file);
            if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                tracing::warn!(file = %file_name, error = %remove_err, "Failed to remove partial image");
            }
            return Err(e.into());
        }

        tracing::debug!(file = %file_name, size = bytes.len(), "Stored cover image");
        Ok(format!("{}/{file_name}", self.url_prefix))
    }

    async fn remove(&self, reference: &str) -> Result<(), ImageError> {
        let Some(file_name) = reference_file_name(reference) else {
            return Ok(());
        };
        match tokio::fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => {
                tracing::debug!(file = %file_name, "Removed cover image");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Image store that keeps uploads in memory.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Default)]
pub struct MemoryImageStore {
    files: std::sync::Arc<tokio::sync::Mutex<std::collections::BTreeMap<String, Vec<u8>>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl MemoryImageStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of stored files.
    pub async fn file_names(&self) -> Vec<String> {
        self.files.lock().await.keys().cloned().collect()
    }

    /// Contents of one stored file.
    pub async fn file(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().await.get(name).cloned()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn store(
        &self,
        isbn: &Isbn,
        original_file_name: &str,
        bytes: &[u8],
    ) -> Result<String, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        let file_name = format!("{isbn}{}", image_extension(original_file_name)?);
        match self.files.lock().await.entry(file_name.clone()) {
            std::collections::btree_map::Entry::Occupied(_) => {
                Err(ImageError::AlreadyExists(file_name))
            }
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(bytes.to_vec());
                Ok(format!("images/{file_name}"))
            }
        }
    }

    async fn remove(&self, reference: &str) -> Result<(), ImageError> {
        if let Some(file_name) = reference_file_name(reference) {
            self.files.lock().await.remove(file_name);
        }
        Ok(())
    }
}
