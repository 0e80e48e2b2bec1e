use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const B2B_USER_FIELDS: [&str; 5] = ["id", "email", "orgId", "costId", "roleId"];

/// A storefront user's membership in a buyer organization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct B2BUser {
    pub id: String,
    pub email: String,
    pub org_id: String,
    pub cost_id: Option<String>,
    pub role_id: String,
}

impl B2BUser {
    pub fn from_document(doc: Value) -> Result<Self> {
        serde_json::from_value(doc).context("Malformed B2B user document")
    }
}
