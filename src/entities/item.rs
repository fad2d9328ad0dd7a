//! Item (product) entity

use super::ActivityStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sellable product or service; no relationship to balances
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub price: f64,

    /// Public URLs returned by the upload endpoint
    #[serde(default)]
    pub images: Vec<String>,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub status: ActivityStatus,

    #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl_document!(Item, "products", "item");

impl Item {
    pub fn editable_fields(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut fields = serde_json::Map::new();
        fields.insert("name".into(), self.name.clone().into());
        fields.insert("description".into(), self.description.clone().into());
        fields.insert("status".into(), self.status.as_str().into());
        fields.insert("images".into(), self.images.clone().into());
        fields.insert("type".into(), self.kind.clone().into());
        fields.insert("price".into(), self.price.into());
        fields
    }
}
