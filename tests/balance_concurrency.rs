//! Concurrency tests for the balance reconciler.
//!
//! The document store has no transactions, so two sequences touching the
//! same customer can interleave between the balance read and the balance
//! write. These tests force that interleaving through a wrapping store and
//! check the outcome under both isolation modes.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tally::balance::{BalanceReconciler, Isolation};
use tally::core::repository::Repository;
use tally::core::store::{DocumentStore, Filter, Sort};
use tally::entities::{Customer, PaymentCapture};
use tally::storage::InMemoryDocumentStore;
use tokio::sync::Barrier;
use uuid::Uuid;

/// How a customer read is held up before it returns
enum Stall {
    /// The first `n` customer reads wait for each other
    Rendezvous(Barrier, AtomicUsize),
    /// Every customer read sleeps after reading
    Sleep(Duration),
}

/// Wraps the in-memory store and stalls reads of the `customer` collection
struct StallingStore {
    inner: InMemoryDocumentStore,
    stall: Stall,
}

impl StallingStore {
    fn rendezvous(readers: usize) -> Self {
        Self {
            inner: InMemoryDocumentStore::new(),
            stall: Stall::Rendezvous(Barrier::new(readers), AtomicUsize::new(readers)),
        }
    }

    fn sleeping(delay: Duration) -> Self {
        Self {
            inner: InMemoryDocumentStore::new(),
            stall: Stall::Sleep(delay),
        }
    }
}

#[async_trait]
impl DocumentStore for StallingStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<Value>> {
        self.inner.find(collection, filter, sort).await
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>> {
        let found = self.inner.find_one(collection, filter).await?;
        if collection == "customer" {
            match &self.stall {
                Stall::Rendezvous(barrier, remaining) => {
                    let armed = remaining
                        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                        .is_ok();
                    if armed {
                        barrier.wait().await;
                    }
                }
                Stall::Sleep(delay) => tokio::time::sleep(*delay).await,
            }
        }
        Ok(found)
    }

    async fn insert(&self, collection: &str, document: Value) -> Result<Uuid> {
        self.inner.insert(collection, document).await
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        fields: Map<String, Value>,
    ) -> Result<u64> {
        self.inner.update(collection, filter, fields).await
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64> {
        self.inner.delete(collection, filter).await
    }
}

async fn seed_customer(store: &Arc<dyn DocumentStore>, name: &str, balance: f64) -> Uuid {
    let customers: Repository<Customer> = Repository::new(store.clone());
    customers
        .insert(Customer::new(name, balance))
        .await
        .unwrap()
        .id
        .unwrap()
}

async fn balance_of(store: &Arc<dyn DocumentStore>, id: Uuid) -> f64 {
    let customers: Repository<Customer> = Repository::new(store.clone());
    customers.require(&id).await.unwrap().balance
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_legacy_isolation_loses_an_update() {
    let store: Arc<dyn DocumentStore> = Arc::new(StallingStore::rendezvous(2));
    let customer = seed_customer(&store, "Racy", 100.0).await;
    let balances = BalanceReconciler::new(store.clone()).with_isolation(Isolation::Legacy);

    let first = tokio::spawn({
        let balances = balances.clone();
        async move { balances.apply_payment_created(customer, 10.0).await }
    });
    let second = tokio::spawn({
        let balances = balances.clone();
        async move { balances.apply_payment_created(customer, 10.0).await }
    });

    let a = first.await.unwrap().unwrap();
    let b = second.await.unwrap().unwrap();

    // Both sequences read 100 before either wrote
    assert_eq!(a.previous, 100.0);
    assert_eq!(b.previous, 100.0);
    assert_eq!(balance_of(&store, customer).await, 90.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_per_key_isolation_serializes_payments() {
    let store: Arc<dyn DocumentStore> =
        Arc::new(StallingStore::sleeping(Duration::from_millis(20)));
    let customer = seed_customer(&store, "Serialized", 100.0).await;
    let balances = BalanceReconciler::new(store.clone()).with_isolation(Isolation::PerKey);

    let first = tokio::spawn({
        let balances = balances.clone();
        async move { balances.apply_payment_created(customer, 10.0).await }
    });
    let second = tokio::spawn({
        let balances = balances.clone();
        async move { balances.apply_payment_created(customer, 10.0).await }
    });

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    assert_eq!(balance_of(&store, customer).await, 80.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_per_key_isolation_many_mixed_deltas() {
    let store: Arc<dyn DocumentStore> =
        Arc::new(StallingStore::sleeping(Duration::from_millis(2)));
    let customer = seed_customer(&store, "Busy", 0.0).await;
    let balances = BalanceReconciler::new(store.clone());

    let mut handles = Vec::new();
    for i in 0..20 {
        let balances = balances.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                balances.apply_invoice_created(customer, 15.0).await
            } else {
                balances.apply_payment_created(customer, 5.0).await
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // 10 invoices of 15 and 10 payments of 5
    assert_eq!(balance_of(&store, customer).await, 100.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_opposite_customer_moves_do_not_deadlock() {
    let store: Arc<dyn DocumentStore> =
        Arc::new(StallingStore::sleeping(Duration::from_millis(5)));
    let alice = seed_customer(&store, "Alice", 100.0).await;
    let bob = seed_customer(&store, "Bob", 100.0).await;
    let balances = BalanceReconciler::new(store.clone());

    let from_alice = balances
        .record_payment(PaymentCapture::new(alice, 10.0), None)
        .await
        .unwrap()
        .id
        .unwrap();
    let from_bob = balances
        .record_payment(PaymentCapture::new(bob, 20.0), None)
        .await
        .unwrap()
        .id
        .unwrap();

    // One payment moves to Bob while the other moves to Alice
    let to_bob = tokio::spawn({
        let balances = balances.clone();
        async move { balances.apply_payment_edited(from_alice, bob, 10.0).await }
    });
    let to_alice = tokio::spawn({
        let balances = balances.clone();
        async move { balances.apply_payment_edited(from_bob, alice, 20.0).await }
    });

    let joined = tokio::time::timeout(Duration::from_secs(5), async {
        (to_bob.await, to_alice.await)
    })
    .await
    .expect("opposite moves deadlocked");
    joined.0.unwrap().unwrap();
    joined.1.unwrap().unwrap();

    // Alice: 100 - 10 + 10 - 20 = 80, Bob: 100 - 20 + 20 - 10 = 90
    assert_eq!(balance_of(&store, alice).await, 80.0);
    assert_eq!(balance_of(&store, bob).await, 90.0);
}
