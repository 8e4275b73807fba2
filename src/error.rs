use thiserror::Error;

use crate::post::PostId;

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("Unable to decode image: {0}")]
    Decode(String),
    #[error("Unable to encode image: {0}")]
    Encode(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage quota exceeded writing {key} ({size} bytes, quota {quota})")]
    QuotaExceeded { key: String, size: usize, quota: usize },
    #[error("Storage error writing {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not persist posts: {0}")]
    StorageQuota(#[source] StorageError),
    #[error("Post {0} not found")]
    NotFound(PostId),
    #[error("Invalid post: {0}")]
    Invalid(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
