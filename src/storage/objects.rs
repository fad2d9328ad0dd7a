//! Object storage for uploaded files

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// One object to store
#[derive(Debug, Clone)]
pub struct PutObject {
    pub bucket: String,
    pub name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Storage for opaque blobs, addressed by bucket and name
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object and return its public URL
    async fn put_object(&self, object: PutObject) -> Result<String>;
}

/// A stored object as kept by [`InMemoryObjectStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-memory object store for tests and local development
///
/// Returned URLs use the `memory://{bucket}/{name}` scheme.
#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<(String, String), StoredObject>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a stored object
    pub fn get(&self, bucket: &str, name: &str) -> Result<Option<StoredObject>> {
        let objects = self
            .objects
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        Ok(objects
            .get(&(bucket.to_string(), name.to_string()))
            .cloned())
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put_object(&self, object: PutObject) -> Result<String> {
        let url = format!("memory://{}/{}", object.bucket, object.name);

        let mut objects = self
            .objects
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        objects.insert(
            (object.bucket, object.name),
            StoredObject {
                bytes: object.bytes,
                content_type: object.content_type,
            },
        );

        Ok(url)
    }
}
