//! Typed access to one collection of the document store

use crate::core::entity::Document;
use crate::core::error::{TallyError, TallyResult};
use crate::core::store::{DocumentStore, Filter, Sort};
use anyhow::Context;
use chrono::Utc;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// Typed repository over a [`DocumentStore`] collection
///
/// Converts between `T` and JSON documents and maps store failures to
/// [`TallyError::Store`] with the collection name as context.
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    fn decode(document: Value) -> TallyResult<T> {
        serde_json::from_value(document)
            .with_context(|| format!("Failed to decode {} document", T::singular()))
            .map_err(TallyError::store)
    }

    /// Fetch a document by id
    pub async fn get(&self, id: &Uuid) -> TallyResult<Option<T>> {
        let document = self
            .store
            .find_one(T::collection(), &Filter::by_id(id))
            .await
            .with_context(|| format!("Failed to read {} {}", T::singular(), id))
            .map_err(TallyError::store)?;

        document.map(Self::decode).transpose()
    }

    /// Fetch a document by id, failing with `NotFound` when absent
    pub async fn require(&self, id: &Uuid) -> TallyResult<T> {
        self.get(id)
            .await?
            .ok_or_else(|| TallyError::not_found(T::collection(), id))
    }

    pub async fn list(&self, filter: &Filter, sort: Option<&Sort>) -> TallyResult<Vec<T>> {
        let documents = self
            .store
            .find(T::collection(), filter, sort)
            .await
            .with_context(|| format!("Failed to list {}", T::collection()))
            .map_err(TallyError::store)?;

        documents.into_iter().map(Self::decode).collect()
    }

    /// Insert a new document
    ///
    /// The server assigns the identifier and the creation timestamp; any
    /// values sent by the client are replaced.
    pub async fn insert(&self, mut entity: T) -> TallyResult<T> {
        entity.set_id(Uuid::new_v4());
        entity.stamp(Utc::now());

        let document = serde_json::to_value(&entity)
            .with_context(|| format!("Failed to encode {}", T::singular()))
            .map_err(TallyError::store)?;

        self.store
            .insert(T::collection(), document)
            .await
            .with_context(|| format!("Failed to insert {}", T::singular()))
            .map_err(TallyError::store)?;

        Ok(entity)
    }

    /// Set fields on an existing document, failing with `NotFound` when absent
    pub async fn set_fields(&self, id: &Uuid, fields: Map<String, Value>) -> TallyResult<()> {
        let matched = self
            .store
            .update(T::collection(), &Filter::by_id(id), fields)
            .await
            .with_context(|| format!("Failed to update {} {}", T::singular(), id))
            .map_err(TallyError::store)?;

        if matched == 0 {
            return Err(TallyError::not_found(T::collection(), id));
        }
        Ok(())
    }

    /// Set a single field
    pub async fn set_field(
        &self,
        id: &Uuid,
        field: &str,
        value: impl Into<Value>,
    ) -> TallyResult<()> {
        let mut fields = Map::new();
        fields.insert(field.to_string(), value.into());
        self.set_fields(id, fields).await
    }

    /// Delete a document, failing with `NotFound` when absent
    pub async fn delete(&self, id: &Uuid) -> TallyResult<()> {
        let deleted = self
            .store
            .delete(T::collection(), &Filter::by_id(id))
            .await
            .with_context(|| format!("Failed to delete {} {}", T::singular(), id))
            .map_err(TallyError::store)?;

        if deleted == 0 {
            return Err(TallyError::not_found(T::collection(), id));
        }
        Ok(())
    }
}
