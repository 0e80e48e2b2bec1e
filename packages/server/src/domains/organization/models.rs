use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Document-store entity holding organizations
pub const ORGANIZATIONS_ENTITY: &str = "organizations";
/// Document-store entity holding organization requests
pub const ORGANIZATION_REQUESTS_ENTITY: &str = "organization_requests";

pub const ORGANIZATION_FIELDS: [&str; 5] = ["id", "name", "status", "collections", "created"];
pub const ORGANIZATION_REQUEST_FIELDS: [&str; 6] =
    ["id", "name", "b2bCustomerAdminEmail", "status", "notes", "created"];

/// A buyer organization (B2B tenant)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    /// "active", "on-hold" or "inactive"
    pub status: String,
    #[serde(default)]
    pub collections: Vec<String>,
    pub created: DateTime<Utc>,
}

impl Organization {
    pub fn from_document(doc: Value) -> Result<Self> {
        serde_json::from_value(doc).context("Malformed organization document")
    }
}

/// A pending request to open a buyer organization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRequest {
    pub id: String,
    pub name: String,
    pub b2b_customer_admin_email: String,
    /// "pending", "approved" or "declined"
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub created: DateTime<Utc>,
}

impl OrganizationRequest {
    pub fn from_document(doc: Value) -> Result<Self> {
        serde_json::from_value(doc).context("Malformed organization request document")
    }
}
