//! Document trait defining the storage contract for all entity types

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Base trait for every persisted entity.
///
/// A single struct serves both as the write payload and as the stored view:
/// the identifier is `None` until the store assigns one, and is omitted from
/// the serialized form while absent.
///
/// Implemented through [`impl_document!`](crate::impl_document).
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection holding documents of this type (e.g., "customer", "invoices")
    fn collection() -> &'static str;

    /// Human-readable singular name used in log lines and errors
    fn singular() -> &'static str;

    /// Get the server-assigned identifier, if any
    fn id(&self) -> Option<Uuid>;

    /// Set the server-assigned identifier
    fn set_id(&mut self, id: Uuid);

    /// Get the creation timestamp, if stamped
    fn created_at(&self) -> Option<DateTime<Utc>>;

    /// Stamp the creation timestamp
    fn stamp(&mut self, at: DateTime<Utc>);
}
