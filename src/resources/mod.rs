//! HTTP handlers, one module per resource
//!
//! Plain CRUD goes straight to the typed repositories. Every mutation that
//! affects a customer balance goes through the [`BalanceReconciler`](crate::balance::BalanceReconciler).

pub mod customers;
pub mod invoices;
pub mod items;
pub mod payload;
pub mod payments;
pub mod state;
pub mod uploads;

pub use customers::CustomerResource;
pub use invoices::InvoiceResource;
pub use items::ItemResource;
pub use payload::{Payload, RequestBody};
pub use payments::PaymentResource;
pub use state::{AppState, parse_id};
pub use uploads::UploadResource;
