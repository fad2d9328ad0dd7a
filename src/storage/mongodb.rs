//! MongoDB storage backend using the official MongoDB async driver.
//!
//! Provides `MongoDocumentStore`, a [`DocumentStore`] backed by a
//! `mongodb::Database`.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag.
//!
//! # Storage model
//!
//! Every logical collection maps to a MongoDB collection of the same name
//! (`customer`, `invoices`, `payments`, `products`).
//!
//! # Serialization strategy
//!
//! Documents travel as `serde_json::Value` and are converted to BSON at the
//! boundary. UUIDs are stored as strings and the `id` field is mapped to
//! MongoDB's `_id` convention.

use crate::core::store::{DocumentStore, Filter, Sort, SortOrder};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Database;
use mongodb::bson::{Bson, Document, doc};
use serde_json::{Map, Value};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a serde_json::Value (expected to be an Object) into a BSON Document,
/// renaming `id` → `_id` for MongoDB convention.
fn json_to_document(json: Value) -> Result<Document> {
    let bson_val = mongodb::bson::to_bson(&json)
        .map_err(|e| anyhow!("Failed to convert JSON to BSON: {}", e))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => return Err(anyhow!("Expected BSON document, got non-object")),
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    Ok(doc)
}

/// Convert a BSON Document back into a serde_json::Value,
/// renaming `_id` → `id` for domain entity convention.
fn document_to_json(mut doc: Document) -> Value {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }

    Bson::Document(doc).into_relaxed_extjson()
}

fn filter_to_document(filter: &Filter) -> Result<Document> {
    let mut query = Document::new();
    for (field, value) in filter.clauses() {
        let key = if field == "id" { "_id" } else { field.as_str() };
        let bson = mongodb::bson::to_bson(value)
            .map_err(|e| anyhow!("Failed to convert filter value for '{}': {}", field, e))?;
        query.insert(key, bson);
    }
    Ok(query)
}

fn sort_to_document(sort: &Sort) -> Document {
    let direction = match sort.order {
        SortOrder::Ascending => 1,
        SortOrder::Descending => -1,
    };
    let field = sort.field.as_str();
    doc! { field: direction }
}

// ---------------------------------------------------------------------------
// MongoDocumentStore
// ---------------------------------------------------------------------------

/// Document store backed by MongoDB.
///
/// # Example
///
/// ```rust,ignore
/// use mongodb::Client;
/// use tally::storage::MongoDocumentStore;
///
/// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
/// let store = MongoDocumentStore::new(client.database("omer"));
/// store.ensure_indexes().await?;
/// ```
#[derive(Clone, Debug)]
pub struct MongoDocumentStore {
    database: Database,
}

impl MongoDocumentStore {
    /// Create a new `MongoDocumentStore` with the given database handle.
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Connect to `url` and open database `name`.
    pub async fn connect(url: &str, name: &str) -> Result<Self> {
        let client = mongodb::Client::with_uri_str(url)
            .await
            .map_err(|e| anyhow!("Failed to connect to MongoDB: {}", e))?;
        Ok(Self::new(client.database(name)))
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection(&self, name: &str) -> mongodb::Collection<Document> {
        self.database.collection(name)
    }

    /// Create the indexes the service relies on.
    ///
    /// Customer numbers are unique when present. Customers without a number,
    /// or whose number was cleared to null, are left out of the index.
    pub async fn ensure_indexes(&self) -> Result<()> {
        use mongodb::IndexModel;
        use mongodb::options::IndexOptions;

        let options = IndexOptions::builder()
            .unique(true)
            .partial_filter_expression(doc! { "number": { "$type": "number" } })
            .build();
        let number = IndexModel::builder()
            .keys(doc! { "number": 1 })
            .options(options)
            .build();

        self.collection("customer")
            .create_index(number)
            .await
            .map_err(|e| anyhow!("Failed to create indexes on customer collection: {}", e))?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<Value>> {
        let query = filter_to_document(filter)?;

        let mut find = self.collection(collection).find(query);
        if let Some(sort) = sort {
            find = find.sort(sort_to_document(sort));
        }

        let cursor = find
            .await
            .map_err(|e| anyhow!("Failed to query {}: {}", collection, e))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect {}: {}", collection, e))?;

        Ok(docs.into_iter().map(document_to_json).collect())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>> {
        let doc = self
            .collection(collection)
            .find_one(filter_to_document(filter)?)
            .await
            .map_err(|e| anyhow!("Failed to get document from {}: {}", collection, e))?;

        Ok(doc.map(document_to_json))
    }

    async fn insert(&self, collection: &str, document: Value) -> Result<Uuid> {
        let mut doc = json_to_document(document)?;

        let id = match doc.get_str("_id").ok().map(str::to_owned) {
            Some(raw) => Uuid::parse_str(&raw).map_err(|e| anyhow!("Invalid document id: {}", e))?,
            None => {
                let id = Uuid::new_v4();
                doc.insert("_id", Bson::String(id.to_string()));
                id
            }
        };

        self.collection(collection)
            .insert_one(doc)
            .await
            .map_err(|e| anyhow!("Failed to insert into {}: {}", collection, e))?;

        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        mut fields: Map<String, Value>,
    ) -> Result<u64> {
        fields.remove("id");
        let set = json_to_document(Value::Object(fields))?;

        let result = self
            .collection(collection)
            .update_one(filter_to_document(filter)?, doc! { "$set": set })
            .await
            .map_err(|e| anyhow!("Failed to update {}: {}", collection, e))?;

        Ok(result.matched_count)
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let result = self
            .collection(collection)
            .delete_one(filter_to_document(filter)?)
            .await
            .map_err(|e| anyhow!("Failed to delete from {}: {}", collection, e))?;

        Ok(result.deleted_count)
    }
}
