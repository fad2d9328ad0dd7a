//! Storage implementations for different backends

pub mod in_memory;
#[cfg(feature = "mongodb_backend")]
pub mod mongodb;
pub mod objects;
#[cfg(feature = "s3")]
pub mod s3;

pub use in_memory::InMemoryDocumentStore;
#[cfg(feature = "mongodb_backend")]
pub use mongodb::MongoDocumentStore;
pub use objects::{InMemoryObjectStore, ObjectStore, PutObject};
#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;

use crate::config::{DatabaseBackend, DatabaseConfig, ObjectBackend, ObjectsConfig};
use crate::core::error::{TallyError, TallyResult};
use crate::core::store::DocumentStore;
use std::sync::Arc;

/// Open the document store selected by the configuration
pub async fn connect_documents(config: &DatabaseConfig) -> TallyResult<Arc<dyn DocumentStore>> {
    match config.backend {
        DatabaseBackend::InMemory => {
            tracing::warn!("using in-memory document store, data is lost on restart");
            Ok(Arc::new(InMemoryDocumentStore::new()))
        }
        #[cfg(feature = "mongodb_backend")]
        DatabaseBackend::Mongodb => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| TallyError::Config("database.url is required for mongodb".into()))?;
            let store = MongoDocumentStore::connect(url, &config.name)
                .await
                .map_err(TallyError::store)?;
            store.ensure_indexes().await.map_err(TallyError::store)?;
            tracing::info!(database = %config.name, "connected to mongodb");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "mongodb_backend"))]
        DatabaseBackend::Mongodb => Err(TallyError::Config(
            "mongodb backend requested but the mongodb_backend feature is disabled".into(),
        )),
    }
}

/// Open the object store selected by the configuration
pub fn connect_objects(config: &ObjectsConfig) -> TallyResult<Arc<dyn ObjectStore>> {
    match config.backend {
        ObjectBackend::InMemory => Ok(Arc::new(InMemoryObjectStore::new())),
        #[cfg(feature = "s3")]
        ObjectBackend::S3 => {
            let missing = |field: &str| TallyError::Config(format!("objects.{field} is required for s3"));
            let endpoint = config.endpoint.as_deref().ok_or_else(|| missing("endpoint"))?;
            let access_key = config.access_key.as_deref().ok_or_else(|| missing("access_key"))?;
            let secret_key = config.secret_key.as_deref().ok_or_else(|| missing("secret_key"))?;
            let public_base_url = config
                .public_base_url
                .clone()
                .unwrap_or_else(|| endpoint.to_string());
            tracing::info!(endpoint, bucket = %config.bucket, "using s3 object store");
            Ok(Arc::new(S3ObjectStore::from_endpoint(
                endpoint,
                access_key,
                secret_key,
                &config.region,
                public_base_url,
            )))
        }
        #[cfg(not(feature = "s3"))]
        ObjectBackend::S3 => Err(TallyError::Config(
            "s3 object store requested but the s3 feature is disabled".into(),
        )),
    }
}
