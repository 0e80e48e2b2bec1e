// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no authorization logic.
// The decision rules live in common::auth and consume these through ServerDeps.
//
// Naming convention: Base* for trait names (e.g., BaseIdentityAuthority)

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::auth::PermissionSet;

// =============================================================================
// Identity Authority (token validation / exchange)
// =============================================================================

/// Claims returned by the identity authority for an accepted token
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Which surface the token was issued for ("admin", "store", ...)
    pub audience: String,
    /// The authenticated subject (account user id or email)
    pub subject: String,
}

/// Storefront user resolved from a store session token
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
}

#[async_trait]
pub trait BaseIdentityAuthority: Send + Sync {
    /// Validate a token. Err means the authority rejected it or the call failed;
    /// callers fold both into "not valid".
    async fn validate_token(&self, token: &str) -> Result<TokenClaims>;

    /// Exchange an API key/secret pair for a first-class token
    async fn get_token(&self, app_key: &str, app_token: &str) -> Result<String>;

    /// Resolve the authenticated storefront user behind a store session token
    async fn get_authenticated_user(&self, store_token: &str) -> Result<Option<AuthenticatedUser>>;

    /// Whether the token's owner holds a named license-manager resource
    async fn check_license_permission(&self, token: &str, resource: &str) -> Result<bool>;
}

// =============================================================================
// Permissions Service (roles + effective permissions for storefront callers)
// =============================================================================

/// User record as known by the permissions service
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionsUser {
    pub id: String,
    pub role_id: String,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub cost_id: Option<String>,
}

/// Role record as known by the permissions service
#[derive(Debug, Clone, Deserialize)]
pub struct RoleInfo {
    pub id: String,
    pub slug: String,
}

#[async_trait]
pub trait BasePermissionsService: Send + Sync {
    /// Effective role + permission set of the caller behind `store_token`,
    /// scoped to the `sender` application identifier
    async fn check_user_permission(
        &self,
        store_token: Option<&str>,
        sender: &str,
    ) -> Result<Option<PermissionSet>>;

    async fn get_role(&self, id: &str) -> Result<Option<RoleInfo>>;

    async fn get_b2b_user(&self, id: &str) -> Result<Option<PermissionsUser>>;
}

// =============================================================================
// Document Store (persistence for organizations / cost centers / users)
// =============================================================================

/// Search parameters for a document-store query
#[derive(Debug, Clone)]
pub struct SearchArgs {
    pub entity: String,
    pub fields: Vec<String>,
    pub filter: Option<String>,
    pub page: i32,
    pub page_size: i32,
}

impl SearchArgs {
    pub fn new(entity: &str, fields: &[&str]) -> Self {
        Self {
            entity: entity.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            filter: None,
            page: 1,
            page_size: 25,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_page(mut self, page: i32, page_size: i32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }
}

#[async_trait]
pub trait BaseDocumentStore: Send + Sync {
    /// Create a document, returning its id
    async fn create_document(&self, entity: &str, body: Value) -> Result<String>;

    async fn get_document(&self, entity: &str, id: &str, fields: &[&str])
        -> Result<Option<Value>>;

    async fn update_document(&self, entity: &str, id: &str, body: Value) -> Result<()>;

    async fn delete_document(&self, entity: &str, id: &str) -> Result<()>;

    async fn search_documents(&self, args: &SearchArgs) -> Result<Vec<Value>>;
}

// =============================================================================
// Analytics / Audit channels (authorization decision side effects)
// =============================================================================

/// One analytics metric describing an authorization decision
#[derive(Debug, Clone, Serialize)]
pub struct AuthMetric {
    pub account: String,
    pub kind: String,
    pub description: String,
    pub fields: Value,
}

/// Structured audit record emitted for denied decisions
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub subject_id: String,
    pub operation: String,
    pub author_id: Option<String>,
    pub meta: AuditMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditMeta {
    pub entity_name: String,
    pub remote_ip_address: Option<String>,
    pub entity_before_action: Option<Value>,
    pub entity_after_action: Option<Value>,
}

#[async_trait]
pub trait BaseAnalyticsChannel: Send + Sync {
    /// Send one metric. Implementations retry internally; a returned Err is
    /// the residual failure after retries and is non-fatal to callers.
    async fn send_metric(&self, metric: &AuthMetric) -> Result<()>;
}

#[async_trait]
pub trait BaseAuditChannel: Send + Sync {
    /// Best-effort: implementations swallow their own errors and log
    async fn send_event(&self, event: AuditEvent);
}

// =============================================================================
// Mail (transactional templates)
// =============================================================================

#[async_trait]
pub trait BaseMailService: Send + Sync {
    async fn send_template(&self, template: &str, to: &str, data: Value) -> Result<()>;
}
