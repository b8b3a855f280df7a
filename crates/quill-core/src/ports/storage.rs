//! Object store and image inspection ports.

use async_trait::async_trait;

use crate::error::DomainError;

/// A blob accepted by the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub url: String,
    pub external_id: String,
}

/// Result of a delete request against the object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Durable blob storage for post images (Cloudinary, in-memory).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under a name hint and return its URL and deletion handle.
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> Result<StoredObject, ObjectStoreError>;

    /// Delete a blob by its handle.
    async fn delete(&self, external_id: &str) -> Result<DeleteOutcome, ObjectStoreError>;
}

/// Reads pixel dimensions from encoded image bytes.
pub trait ImageInspector: Send + Sync {
    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), ObjectStoreError>;
}

/// Object store errors.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("Object store request failed: {0}")]
    Request(String),

    #[error("Object store rejected the request: {0}")]
    Rejected(String),

    #[error("Object store request timed out")]
    Timeout,

    #[error("Invalid image file: {0}")]
    InvalidImage(String),
}

impl From<ObjectStoreError> for DomainError {
    fn from(err: ObjectStoreError) -> Self {
        match err {
            ObjectStoreError::Timeout => DomainError::Timeout,
            ObjectStoreError::InvalidImage(_) => DomainError::Validation(err.to_string()),
            ObjectStoreError::Request(_) | ObjectStoreError::Rejected(_) => {
                DomainError::Upstream(err.to_string())
            }
        }
    }
}
