//! # tally
//!
//! A small billing backend: customers, items, invoices and payment captures
//! over a document store, with every invoice and payment keeping its
//! customer's running balance in step.
//!
//! ## Balance reconciliation
//!
//! | Event | Customer balance |
//! |---|---|
//! | invoice recorded | `b + total` |
//! | payment recorded | `b - amount` |
//! | invoice amended | `(b - old_total) + new_total` |
//! | payment amended | `(b + old_amount) - new_amount` |
//! | payment reverted | `b + amount`, payment deleted |
//! | invoice reverted | `b - total`, invoice deleted |
//!
//! The document store has no multi-document transactions. Each sequence runs
//! under a per-key guard (see [`balance::Isolation`]) and the first failing
//! step aborts it without rolling back earlier writes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tally::prelude::*;
//!
//! let app = ServerBuilder::new()
//!     .with_document_store(InMemoryDocumentStore::new())
//!     .build()?;
//! ```

pub mod balance;
pub mod config;
pub mod core;
pub mod entities;
pub mod resources;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    pub use crate::balance::{
        BalanceChange, BalanceHook, BalanceReconciler, Isolation, NoopBalanceHook,
    };
    pub use crate::config::AppConfig;
    pub use crate::core::{
        Document, DocumentStore, ErrorResponse, Filter, Repository, Sort, SortOrder, TallyError,
        TallyResult,
    };
    pub use crate::entities::{
        ActivityStatus, Customer, Invoice, InvoiceLine, InvoiceStatus, Item, PaymentCapture,
    };
    pub use crate::resources::AppState;
    pub use crate::server::ServerBuilder;
    pub use crate::storage::{InMemoryDocumentStore, InMemoryObjectStore, ObjectStore, PutObject};

    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoDocumentStore;
    #[cfg(feature = "s3")]
    pub use crate::storage::S3ObjectStore;

    pub use crate::{impl_document, string_status};
}
