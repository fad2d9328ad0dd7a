//! Shared handler state

use crate::balance::BalanceReconciler;
use crate::core::error::{TallyError, TallyResult};
use crate::core::repository::Repository;
use crate::core::store::DocumentStore;
use crate::entities::{Customer, Invoice, Item, PaymentCapture};
use crate::storage::ObjectStore;
use std::sync::Arc;
use uuid::Uuid;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub items: Repository<Item>,
    pub customers: Repository<Customer>,
    pub invoices: Repository<Invoice>,
    pub payments: Repository<PaymentCapture>,
    pub balances: BalanceReconciler,
    pub objects: Arc<dyn ObjectStore>,
    /// Bucket receiving uploads
    pub bucket: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        balances: BalanceReconciler,
        objects: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            items: Repository::new(store.clone()),
            customers: Repository::new(store.clone()),
            invoices: Repository::new(store.clone()),
            payments: Repository::new(store),
            balances,
            objects,
            bucket: bucket.into(),
        }
    }
}

/// Parse a path identifier
pub fn parse_id(raw: &str) -> TallyResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| TallyError::invalid_reference(raw, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);

        match parse_id("64b0c0ffee") {
            Err(TallyError::InvalidReference { value, .. }) => assert_eq!(value, "64b0c0ffee"),
            other => panic!("expected InvalidReference, got {other:?}"),
        }
    }
}
