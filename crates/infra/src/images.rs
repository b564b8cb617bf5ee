//! Content-directory persistence for uploaded image bytes.
//!
//! The rest of the system only ever sees generated filenames and relative
//! reference strings; this adapter owns the actual directory.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageStoreError {
    /// The referenced image is no longer on disk (e.g. removed externally).
    #[error("stored image missing: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ImageStore: Send + Sync + 'static {
    async fn put(&self, filename: &str, bytes: &[u8]) -> Result<(), ImageStoreError>;

    async fn get(&self, filename: &str) -> Result<Vec<u8>, ImageStoreError>;
}

/// Flat directory of image files, created on construction.
pub struct DirImageStore {
    root: PathBuf,
}

impl DirImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ImageStoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }
}

#[async_trait]
impl ImageStore for DirImageStore {
    async fn put(&self, filename: &str, bytes: &[u8]) -> Result<(), ImageStoreError> {
        tokio::fs::write(self.root.join(filename), bytes).await?;
        Ok(())
    }

    async fn get(&self, filename: &str) -> Result<Vec<u8>, ImageStoreError> {
        match tokio::fs::read(self.root.join(filename)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ImageStoreError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
