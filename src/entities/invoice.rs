//! Invoice entity with its embedded customer snapshot and lines

use super::Customer;
use crate::core::error::{TallyError, TallyResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

string_status!(InvoiceStatus, default = Unpaid, {
    Unpaid => "unpaid",
    Paid => "paid",
});

/// One invoice line: an item snapshot with quantity and subtotal
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Identifier of the item this line was taken from
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Uuid>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub qty: i64,

    #[serde(default)]
    pub price: f64,

    #[serde(rename = "totalp", default)]
    pub subtotal: f64,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub status: String,
}

/// An invoice issued to a customer
///
/// The embedded `customer` is a snapshot taken at creation time; its `id` is
/// the reference whose balance the invoice total is applied to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    #[serde(default)]
    pub status: InvoiceStatus,

    #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    pub customer: Customer,

    #[serde(default)]
    pub items: Vec<InvoiceLine>,

    #[serde(default)]
    pub total: f64,
}

impl_document!(Invoice, "invoices", "invoice");

impl Invoice {
    pub fn new(customer: Customer, items: Vec<InvoiceLine>, total: f64) -> Self {
        Self {
            customer,
            items,
            total,
            ..Self::default()
        }
    }

    /// The customer whose balance this invoice affects
    pub fn customer_ref(&self) -> TallyResult<Uuid> {
        self.customer.id.ok_or_else(|| {
            TallyError::invalid_reference("", "invoice customer snapshot has no id")
        })
    }

    /// Fields replaced by an invoice edit
    pub fn editable_fields(&self) -> TallyResult<serde_json::Map<String, serde_json::Value>> {
        let mut fields = serde_json::Map::new();
        fields.insert("total".into(), self.total.into());
        fields.insert("status".into(), self.status.as_str().into());
        fields.insert(
            "items".into(),
            serde_json::to_value(&self.items).map_err(|e| TallyError::Internal(e.to_string()))?,
        );
        fields.insert(
            "customer".into(),
            serde_json::to_value(&self.customer)
                .map_err(|e| TallyError::Internal(e.to_string()))?,
        );
        Ok(fields)
    }
}
