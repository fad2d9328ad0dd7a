//! Document store trait, filters and sort orders
//!
//! The store is agnostic to business rules: it knows collections, JSON
//! documents and equality filters. Every document carries its identifier
//! under the `id` key as a UUID string.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use uuid::Uuid;

/// Conjunction of top-level field equalities
///
/// An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    /// Match every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Match the document with the given identifier
    pub fn by_id(id: &Uuid) -> Self {
        Self::all().and("id", Value::String(id.to_string()))
    }

    /// Match documents whose `field` equals `value`
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and(field, value)
    }

    /// Add another equality clause
    pub fn and(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Check a JSON document against every clause
    pub fn matches(&self, document: &Value) -> bool {
        document
            .as_object()
            .is_some_and(|fields| self.matches_fields(fields))
    }

    pub fn matches_fields(&self, fields: &Map<String, Value>) -> bool {
        self.clauses
            .iter()
            .all(|(field, expected)| fields.get(field) == Some(expected))
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Ordering on a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Descending,
        }
    }

    /// Compare two documents on the sort field
    ///
    /// Missing fields sort first, numbers compare numerically and strings
    /// lexicographically. Mixed types fall back to their JSON rendering.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ordering = compare_values(a.get(&self.field), b.get(&self.field));
        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// Storage trait for JSON documents grouped in named collections
///
/// Implementations provide single-document writes only: there is no
/// transaction spanning two calls.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Find every document matching the filter, optionally sorted
    async fn find(&self, collection: &str, filter: &Filter, sort: Option<&Sort>)
    -> Result<Vec<Value>>;

    /// Find the first document matching the filter
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>>;

    /// Insert a document and return its identifier
    ///
    /// A fresh identifier is generated when the document has no `id`.
    async fn insert(&self, collection: &str, document: Value) -> Result<Uuid>;

    /// Set the given fields on the first matching document
    ///
    /// Returns the number of matched documents (0 or 1).
    async fn update(&self, collection: &str, filter: &Filter, fields: Map<String, Value>)
    -> Result<u64>;

    /// Delete the first matching document
    ///
    /// Returns the number of deleted documents (0 or 1).
    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64>;
}
