//! Customer entity: the aggregate root holding the running balance

use super::ActivityStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A billed customer
///
/// `balance` is the amount the customer owes. It is changed by the balance
/// reconciler whenever an invoice or payment referencing the customer is
/// recorded, amended or reverted, and by an explicit customer edit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "careof", default)]
    pub care_of: String,

    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub balance: f64,

    #[serde(default)]
    pub description: String,

    /// Contact number; unique across customers when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<f64>,

    #[serde(rename = "monthlypayf", default)]
    pub monthly_pay_fixed: f64,

    #[serde(rename = "monthlypayr", default)]
    pub monthly_pay_rate: f64,

    /// Day of the month payment is due
    #[serde(rename = "dueday", default)]
    pub due_day: i64,

    #[serde(default)]
    pub status: ActivityStatus,

    #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl_document!(Customer, "customer", "customer");

impl Customer {
    pub fn new(name: impl Into<String>, balance: f64) -> Self {
        Self {
            name: name.into(),
            balance,
            ..Self::default()
        }
    }

    /// Fields overwritten by a customer edit
    ///
    /// The identifier and creation timestamp are never part of an edit.
    pub fn editable_fields(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut fields = serde_json::Map::new();
        fields.insert("name".into(), self.name.clone().into());
        fields.insert("careof".into(), self.care_of.clone().into());
        fields.insert("address".into(), self.address.clone().into());
        fields.insert("balance".into(), self.balance.into());
        fields.insert("description".into(), self.description.clone().into());
        // null clears a stored number
        fields.insert(
            "number".into(),
            self.number.map_or(serde_json::Value::Null, Into::into),
        );
        fields.insert("monthlypayf".into(), self.monthly_pay_fixed.into());
        fields.insert("monthlypayr".into(), self.monthly_pay_rate.into());
        fields.insert("dueday".into(), self.due_day.into());
        fields.insert("status".into(), self.status.as_str().into());
        fields
    }
}
