//! Blob storage for uploaded images.
//!
//! Objects are written below `<storage dir>/farmers-place/` and served
//! read-only at `/storage/farmers-place/`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Bucket all uploads are stored in.
pub const BUCKET: &str = "farmers-place";

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Errors from storing an upload.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Only image uploads are allowed")]
    UnsupportedType,

    #[error("Image must be at most {max} bytes")]
    TooLarge { max: usize },

    #[error("Uploaded file is empty")]
    Empty,

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An uploaded file as received from a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// An object written to the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Path inside the bucket, e.g. `post-images/{uuid}.png`.
    pub path: String,
    pub url: String,
}

/// Local-directory blob storage.
#[derive(Debug, Clone)]
pub struct BlobStorage {
    root: PathBuf,
    public_base: String,
}

impl BlobStorage {
    /// Storage rooted at `root`, with public URLs under `base_url`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base: format!("{}/storage/{BUCKET}", base_url.trim_end_matches('/')),
        }
    }

    /// Directory holding the bucket's objects.
    #[must_use]
    pub fn bucket_dir(&self) -> PathBuf {
        self.root.join(BUCKET)
    }

    /// Public URL of an object path inside the bucket.
    #[must_use]
    pub fn public_url(&self, object_path: &str) -> String {
        format!("{}/{object_path}", self.public_base)
    }

    /// Store an image under `folder/{uuid}.{ext}`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UnsupportedType` for non-image content,
    /// `StorageError::TooLarge` or `StorageError::Empty` for bad sizes, and
    /// `StorageError::Io` if the file cannot be written.
    pub async fn store_image(
        &self,
        folder: &str,
        upload: &Upload,
    ) -> Result<StoredObject, StorageError> {
        let is_image = upload
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"));
        if !is_image {
            return Err(StorageError::UnsupportedType);
        }
        if upload.bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        if upload.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(StorageError::TooLarge {
                max: MAX_UPLOAD_BYTES,
            });
        }

        let ext = file_extension(upload.file_name.as_deref(), upload.content_type.as_deref());
        let object_path = format!("{folder}/{}.{ext}", Uuid::new_v4());

        let path = self.bucket_dir().join(&object_path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &upload.bytes).await?;

        tracing::info!(object = %object_path, bytes = upload.bytes.len(), "Stored upload");
        Ok(StoredObject {
            url: self.public_url(&object_path),
            path: object_path,
        })
    }

    /// Delete a stored object. A missing object is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the file exists but cannot be removed.
    pub async fn delete(&self, object_path: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.bucket_dir().join(object_path)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Extension for a stored object: the upload's own if it is sane, otherwise
/// one derived from the content type, otherwise `bin`.
fn file_extension(file_name: Option<&str>, content_type: Option<&str>) -> String {
    let from_name = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(str::to_ascii_lowercase);

    if let Some(ext) = from_name {
        return ext;
    }

    let from_type = match content_type {
        Some("image/jpeg") => "jpg",
        Some("image/png") => "png",
        Some("image/gif") => "gif",
        Some("image/webp") => "webp",
        Some("image/svg+xml") => "svg",
        _ => "bin",
    };
    from_type.to_owned()
}
