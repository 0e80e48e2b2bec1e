use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Document-store entity holding cost centers
pub const COST_CENTERS_ENTITY: &str = "cost_centers";

pub const COST_CENTER_FIELDS: [&str; 5] = ["id", "name", "organization", "addresses", "created"];

/// A cost center within a buyer organization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostCenter {
    pub id: String,
    pub name: String,
    /// Owning organization id
    pub organization: String,
    #[serde(default)]
    pub addresses: Vec<String>,
    pub created: DateTime<Utc>,
}

impl CostCenter {
    pub fn from_document(doc: Value) -> Result<Self> {
        serde_json::from_value(doc).context("Malformed cost center document")
    }
}
