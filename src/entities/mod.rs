//! Entities managed by the service
//!
//! Wire names follow the JSON keys the billing front-end already sends
//! (`careof`, `custId`, `totalp`, ...), mapped onto Rust field names.

#[macro_use]
pub mod macros;

pub mod customer;
pub mod invoice;
pub mod item;
pub mod payment;

pub use customer::Customer;
pub use invoice::{Invoice, InvoiceLine, InvoiceStatus};
pub use item::Item;
pub use payment::PaymentCapture;

string_status!(ActivityStatus, default = Active, {
    Active => "active",
    Disabled => "disabled",
});
