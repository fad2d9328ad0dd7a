//! In-memory implementation of DocumentStore for testing and development

use crate::core::store::{DocumentStore, Filter, Sort};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

type Collection = Vec<Map<String, Value>>;

/// In-memory document store
///
/// Useful for testing and development. Each collection keeps documents in
/// insertion order behind a single `RwLock`, so every call is atomic with
/// respect to the others but nothing spans two calls.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl InMemoryDocumentStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self::default()
    }
}

fn as_object(document: Value) -> Result<Map<String, Value>> {
    match document {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("Expected a JSON object, got {}", other)),
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<Value>> {
        let collections = self
            .collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut documents: Vec<Value> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches_fields(doc))
                    .map(|doc| Value::Object(doc.clone()))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort) = sort {
            documents.sort_by(|a, b| sort.compare(a, b));
        }

        Ok(documents)
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>> {
        let collections = self
            .collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(collections.get(collection).and_then(|docs| {
            docs.iter()
                .find(|doc| filter.matches_fields(doc))
                .map(|doc| Value::Object(doc.clone()))
        }))
    }

    async fn insert(&self, collection: &str, document: Value) -> Result<Uuid> {
        let mut document = as_object(document)?;

        let id = match document.get("id").and_then(Value::as_str) {
            Some(raw) => Uuid::parse_str(raw).map_err(|e| anyhow!("Invalid document id: {}", e))?,
            None => Uuid::new_v4(),
        };
        document.insert("id".to_string(), Value::String(id.to_string()));

        let mut collections = self
            .collections
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let docs = collections.entry(collection.to_string()).or_default();
        if docs
            .iter()
            .any(|doc| doc.get("id").and_then(Value::as_str) == Some(id.to_string().as_str()))
        {
            return Err(anyhow!("Duplicate id {} in {}", id, collection));
        }
        docs.push(document);

        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        fields: Map<String, Value>,
    ) -> Result<u64> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let target = docs.iter_mut().find(|doc| filter.matches_fields(doc));

        match target {
            Some(doc) => {
                for (key, value) in fields {
                    // The identifier is immutable
                    if key != "id" {
                        doc.insert(key, value);
                    }
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let position = docs.iter().position(|doc| filter.matches_fields(doc));

        match position {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
