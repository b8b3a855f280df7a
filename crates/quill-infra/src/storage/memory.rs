//! In-memory object store - used when Cloudinary is not configured, and in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::ports::{DeleteOutcome, ObjectStore, ObjectStoreError, StoredObject};

/// Keeps uploaded blobs in a `HashMap`. Data is lost on process restart.
pub struct InMemoryObjectStore {
    folder: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryObjectStore {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub async fn contains(&self, external_id: &str) -> bool {
        self.objects.read().await.contains_key(external_id)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new("blog-posts")
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> Result<StoredObject, ObjectStoreError> {
        let external_id = format!("{}/{}", self.folder, Uuid::new_v4().simple());
        tracing::debug!(%external_id, name, size = bytes.len(), "Storing blob in memory");

        self.objects.write().await.insert(external_id.clone(), bytes);
        Ok(StoredObject {
            url: format!("memory://{external_id}"),
            external_id,
        })
    }

    async fn delete(&self, external_id: &str) -> Result<DeleteOutcome, ObjectStoreError> {
        let removed = self.objects.write().await.remove(external_id);
        Ok(match removed {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }
}
