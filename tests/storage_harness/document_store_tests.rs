//! Macro-generated contract suite for `DocumentStore` implementations.
//!
//! The `document_store_tests!` macro generates a test module that validates
//! any `DocumentStore` against the behavior the repositories and the balance
//! reconciler rely on: id assignment, equality filters, single-field sorts,
//! partial updates and deletes reporting how many documents they touched.
//!
//! # Generated Tests
//!
//! ## Insert & Find
//! - `test_insert_generates_id`: a document without `id` gets a fresh one
//! - `test_insert_keeps_given_id`: a provided `id` is used as is
//! - `test_find_one_missing`: unknown id returns None
//! - `test_find_empty_collection`: find on an empty collection returns nothing
//!
//! ## Filters & Sorts
//! - `test_find_by_string_field`: equality on a string field
//! - `test_find_conjunction`: two clauses must both hold
//! - `test_sort_ascending_by_name` / `test_sort_descending_by_price`
//!
//! ## Update & Delete
//! - `test_update_sets_fields_only`: untouched fields survive
//! - `test_update_missing_matches_zero`
//! - `test_delete_existing` / `test_delete_missing_deletes_zero`
//!
//! ## Edge Cases
//! - `test_collections_are_isolated`
//! - `test_concurrent_inserts`: parallel inserts from spawned tasks

/// Generate a `DocumentStore` conformance test suite.
///
/// `$factory` must be an expression (it may contain `.await`) evaluating to
/// a value implementing `DocumentStore + 'static`. It is re-evaluated for
/// every test.
#[macro_export]
macro_rules! document_store_tests {
    ($factory:expr) => {
        mod document_store_contract_tests {
            use super::*;
            use serde_json::{Map, Value, json};
            use std::sync::Arc;
            use tally::core::store::{DocumentStore, Filter, Sort};
            use uuid::Uuid;

            // ==================================================================
            // Insert & Find
            // ==================================================================

            #[tokio::test]
            async fn test_insert_generates_id() {
                let store = $factory;
                let id = store
                    .insert(TEST_COLLECTION, product("Bolt", 0.25, "good"))
                    .await
                    .unwrap();

                let found = store
                    .find_one(TEST_COLLECTION, &Filter::by_id(&id))
                    .await
                    .unwrap()
                    .expect("inserted document should be found");
                assert_eq!(found["id"], json!(id.to_string()));
                assert_eq!(found["name"], "Bolt");
                assert_eq!(found["type"], "good");
            }

            #[tokio::test]
            async fn test_insert_keeps_given_id() {
                let store = $factory;
                let id = Uuid::new_v4();
                let returned = store
                    .insert(TEST_COLLECTION, product_with_id(id, "Nut", 0.1))
                    .await
                    .unwrap();
                assert_eq!(returned, id);

                let found = store
                    .find_one(TEST_COLLECTION, &Filter::by_id(&id))
                    .await
                    .unwrap();
                assert!(found.is_some());
            }

            #[tokio::test]
            async fn test_find_one_missing() {
                let store = $factory;
                let found = store
                    .find_one(TEST_COLLECTION, &Filter::by_id(&Uuid::new_v4()))
                    .await
                    .unwrap();
                assert!(found.is_none());
            }

            #[tokio::test]
            async fn test_find_empty_collection() {
                let store = $factory;
                let docs = store
                    .find("harness_empty", &Filter::all(), None)
                    .await
                    .unwrap();
                assert_count(&docs, 0);
            }

            // ==================================================================
            // Filters & Sorts
            // ==================================================================

            #[tokio::test]
            async fn test_find_by_string_field() {
                let store = $factory;
                for doc in sample_products(6) {
                    store.insert(TEST_COLLECTION, doc).await.unwrap();
                }

                let services = store
                    .find(TEST_COLLECTION, &Filter::eq("type", "service"), None)
                    .await
                    .unwrap();
                assert_count(&services, 3);
                assert!(services.iter().all(|d| d["type"] == "service"));
            }

            #[tokio::test]
            async fn test_find_conjunction() {
                let store = $factory;
                for doc in sample_products(4) {
                    store.insert(TEST_COLLECTION, doc).await.unwrap();
                }

                let filter = Filter::eq("type", "good").and("name", "Product_02");
                let docs = store.find(TEST_COLLECTION, &filter, None).await.unwrap();
                assert_eq!(names(&docs), vec!["Product_02"]);

                let none = Filter::eq("type", "service").and("name", "Product_02");
                let docs = store.find(TEST_COLLECTION, &none, None).await.unwrap();
                assert_count(&docs, 0);
            }

            #[tokio::test]
            async fn test_sort_ascending_by_name() {
                let store = $factory;
                for name in ["Washer", "Anchor", "Mallet"] {
                    store
                        .insert(TEST_COLLECTION, product(name, 1.0, "good"))
                        .await
                        .unwrap();
                }

                let docs = store
                    .find(TEST_COLLECTION, &Filter::all(), Some(&Sort::ascending("name")))
                    .await
                    .unwrap();
                assert_eq!(names(&docs), vec!["Anchor", "Mallet", "Washer"]);
            }

            #[tokio::test]
            async fn test_sort_descending_by_price() {
                let store = $factory;
                for (name, price) in [("Cheap", 1.5), ("Dear", 40.0), ("Mid", 9.0)] {
                    store
                        .insert(TEST_COLLECTION, product(name, price, "good"))
                        .await
                        .unwrap();
                }

                let docs = store
                    .find(
                        TEST_COLLECTION,
                        &Filter::all(),
                        Some(&Sort::descending("price")),
                    )
                    .await
                    .unwrap();
                assert_eq!(names(&docs), vec!["Dear", "Mid", "Cheap"]);
            }

            // ==================================================================
            // Update & Delete
            // ==================================================================

            #[tokio::test]
            async fn test_update_sets_fields_only() {
                let store = $factory;
                let id = store
                    .insert("harness_customer", customer("Ada", 100.0))
                    .await
                    .unwrap();

                let mut fields = Map::new();
                fields.insert("balance".into(), json!(250.0));
                let matched = store
                    .update("harness_customer", &Filter::by_id(&id), fields)
                    .await
                    .unwrap();
                assert_eq!(matched, 1);

                let found = store
                    .find_one("harness_customer", &Filter::by_id(&id))
                    .await
                    .unwrap()
                    .unwrap();
                assert_close(found["balance"].as_f64().unwrap(), 250.0);
                assert_eq!(found["name"], "Ada");
                assert_eq!(found["address"], "1 Main St");
                assert_eq!(found["id"], json!(id.to_string()));
            }

            #[tokio::test]
            async fn test_update_missing_matches_zero() {
                let store = $factory;
                let mut fields = Map::new();
                fields.insert("name".into(), Value::from("ghost"));
                let matched = store
                    .update(TEST_COLLECTION, &Filter::by_id(&Uuid::new_v4()), fields)
                    .await
                    .unwrap();
                assert_eq!(matched, 0);
            }

            #[tokio::test]
            async fn test_delete_existing() {
                let store = $factory;
                let id = store
                    .insert(TEST_COLLECTION, product("Temporary", 3.0, "good"))
                    .await
                    .unwrap();

                let deleted = store
                    .delete(TEST_COLLECTION, &Filter::by_id(&id))
                    .await
                    .unwrap();
                assert_eq!(deleted, 1);

                let found = store
                    .find_one(TEST_COLLECTION, &Filter::by_id(&id))
                    .await
                    .unwrap();
                assert!(found.is_none());
            }

            #[tokio::test]
            async fn test_delete_missing_deletes_zero() {
                let store = $factory;
                let deleted = store
                    .delete(TEST_COLLECTION, &Filter::by_id(&Uuid::new_v4()))
                    .await
                    .unwrap();
                assert_eq!(deleted, 0);
            }

            // ==================================================================
            // Edge Cases
            // ==================================================================

            #[tokio::test]
            async fn test_collections_are_isolated() {
                let store = $factory;
                let id = store
                    .insert("harness_customer", customer("Isolated", 0.0))
                    .await
                    .unwrap();

                let other = store
                    .find_one(TEST_COLLECTION, &Filter::by_id(&id))
                    .await
                    .unwrap();
                assert!(other.is_none());
            }

            #[tokio::test]
            async fn test_concurrent_inserts() {
                let store = Arc::new($factory);
                let mut handles = Vec::new();
                for doc in sample_products(10) {
                    let store = store.clone();
                    handles.push(tokio::spawn(async move {
                        store.insert(TEST_COLLECTION, doc).await.unwrap()
                    }));
                }

                let mut ids = Vec::new();
                for handle in handles {
                    ids.push(handle.await.unwrap());
                }
                ids.sort();
                ids.dedup();
                assert_count(&ids, 10);

                let docs = store
                    .find(TEST_COLLECTION, &Filter::all(), None)
                    .await
                    .unwrap();
                assert_count(&docs, 10);
            }
        }
    };
}
