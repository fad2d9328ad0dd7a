//! Payment capture entity

use crate::core::error::{TallyError, TallyResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A captured payment against a customer balance
///
/// The customer reference is kept as the raw string the client sent, so a
/// malformed reference is reported as an invalid reference when the payment
/// is reconciled rather than as an unreadable body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentCapture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    #[serde(rename = "custId", default)]
    pub customer_id: String,

    #[serde(default)]
    pub amount: f64,

    /// Payment processor identifier
    #[serde(rename = "stripeid", default)]
    pub processor_id: String,

    #[serde(default)]
    pub mode: String,

    /// Invoice this payment settled, when captured against one
    #[serde(rename = "invoiceId", default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<Uuid>,

    #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl_document!(PaymentCapture, "payments", "payment");

impl PaymentCapture {
    pub fn new(customer_id: Uuid, amount: f64) -> Self {
        Self {
            customer_id: customer_id.to_string(),
            amount,
            ..Self::default()
        }
    }

    /// The customer whose balance this payment affects
    pub fn customer_ref(&self) -> TallyResult<Uuid> {
        Uuid::parse_str(self.customer_id.trim())
            .map_err(|e| TallyError::invalid_reference(&self.customer_id, e.to_string()))
    }

    /// Fields replaced by a payment edit
    pub fn editable_fields(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut fields = serde_json::Map::new();
        fields.insert("custId".into(), self.customer_id.clone().into());
        fields.insert("amount".into(), self.amount.into());
        fields.insert("stripeid".into(), self.processor_id.clone().into());
        fields.insert("mode".into(), self.mode.clone().into());
        fields
    }
}
