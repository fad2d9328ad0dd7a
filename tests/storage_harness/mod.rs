//! Shared test harness for document store backends
//!
//! Provides sample documents shaped like the billing collections and the
//! `document_store_tests!` contract suite.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//!
//! document_store_tests!(InMemoryDocumentStore::new());
//! ```

#![allow(dead_code)]

#[macro_use]
mod document_store_tests;

use serde_json::{Value, json};
use uuid::Uuid;

/// Collection used by the contract suite
pub const TEST_COLLECTION: &str = "harness_products";

// ---------------------------------------------------------------------------
// Helper functions: document creation
// ---------------------------------------------------------------------------

/// A product-like document without an identifier
pub fn product(name: &str, price: f64, kind: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{name} description"),
        "price": price,
        "images": [],
        "type": kind,
        "status": "active",
    })
}

/// A product-like document carrying a fixed identifier
pub fn product_with_id(id: Uuid, name: &str, price: f64) -> Value {
    let mut doc = product(name, price, "good");
    doc["id"] = json!(id.to_string());
    doc
}

/// A customer-like document with the given balance
pub fn customer(name: &str, balance: f64) -> Value {
    json!({
        "name": name,
        "careof": "",
        "address": "1 Main St",
        "balance": balance,
        "description": "",
        "monthlypayf": 0.0,
        "monthlypayr": 0.0,
        "dueday": 1,
        "status": "active",
    })
}

/// Generate `n` products with distinct names and prices
pub fn sample_products(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            product(
                &format!("Product_{i:02}"),
                (i as f64) * 2.5 + 1.0,
                if i % 2 == 0 { "good" } else { "service" },
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Assertion helpers
// ---------------------------------------------------------------------------

/// Names of the documents, in order
pub fn names(docs: &[Value]) -> Vec<String> {
    docs.iter()
        .map(|d| d["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

pub fn assert_count<T>(list: &[T], expected: usize) {
    assert_eq!(
        list.len(),
        expected,
        "Expected {} documents, got {}",
        expected,
        list.len()
    );
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "Expected {}, got {}",
        expected,
        actual
    );
}
