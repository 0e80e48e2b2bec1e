// Mock implementations of the Base* traits for testing
//
// Each mock captures its calls so tests can assert on interaction order and
// counts. Configure with the with_* builders, then bundle into ServerDeps via
// TestDeps::build().

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{
    AuditEvent, AuthMetric, AuthenticatedUser, BaseAnalyticsChannel, BaseAuditChannel,
    BaseDocumentStore, BaseIdentityAuthority, BaseMailService, BasePermissionsService,
    PermissionsUser, RoleInfo, SearchArgs, ServerDeps, TokenClaims,
};
use crate::common::auth::PermissionSet;

// =============================================================================
// Mock Identity Authority
// =============================================================================

pub struct MockIdentityAuthority {
    /// token -> claims accepted by validate_token
    valid_tokens: Mutex<HashMap<String, TokenClaims>>,
    /// (app_key, app_token) -> exchanged token
    exchanges: Mutex<HashMap<(String, String), String>>,
    /// store token -> authenticated user
    store_users: Mutex<HashMap<String, AuthenticatedUser>>,
    /// (token, resource) pairs granted by the license manager
    license_grants: Mutex<Vec<(String, String)>>,
    /// When set, validate_token always errors (authority outage)
    fail_validate: Mutex<bool>,
    validate_calls: Mutex<Vec<String>>,
    exchange_calls: Mutex<Vec<(String, String)>>,
}

impl MockIdentityAuthority {
    pub fn new() -> Self {
        Self {
            valid_tokens: Mutex::new(HashMap::new()),
            exchanges: Mutex::new(HashMap::new()),
            store_users: Mutex::new(HashMap::new()),
            license_grants: Mutex::new(Vec::new()),
            fail_validate: Mutex::new(false),
            validate_calls: Mutex::new(Vec::new()),
            exchange_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_valid_token(self, token: &str, audience: &str, subject: &str) -> Self {
        self.valid_tokens.lock().unwrap().insert(
            token.to_string(),
            TokenClaims {
                audience: audience.to_string(),
                subject: subject.to_string(),
            },
        );
        self
    }

    pub fn with_exchange(self, app_key: &str, app_token: &str, token: &str) -> Self {
        self.exchanges.lock().unwrap().insert(
            (app_key.to_string(), app_token.to_string()),
            token.to_string(),
        );
        self
    }

    pub fn with_store_user(self, store_token: &str, user_id: &str, email: &str) -> Self {
        self.store_users.lock().unwrap().insert(
            store_token.to_string(),
            AuthenticatedUser {
                user_id: user_id.to_string(),
                email: email.to_string(),
            },
        );
        self
    }

    pub fn with_license_grant(self, token: &str, resource: &str) -> Self {
        self.license_grants
            .lock()
            .unwrap()
            .push((token.to_string(), resource.to_string()));
        self
    }

    pub fn failing_validation(self) -> Self {
        *self.fail_validate.lock().unwrap() = true;
        self
    }

    /// Tokens passed to validate_token, in call order
    pub fn validate_calls(&self) -> Vec<String> {
        self.validate_calls.lock().unwrap().clone()
    }

    pub fn exchange_calls(&self) -> Vec<(String, String)> {
        self.exchange_calls.lock().unwrap().clone()
    }
}

impl Default for MockIdentityAuthority {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseIdentityAuthority for MockIdentityAuthority {
    async fn validate_token(&self, token: &str) -> Result<TokenClaims> {
        self.validate_calls.lock().unwrap().push(token.to_string());

        if *self.fail_validate.lock().unwrap() {
            anyhow::bail!("identity authority unavailable");
        }

        self.valid_tokens
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("token rejected"))
    }

    async fn get_token(&self, app_key: &str, app_token: &str) -> Result<String> {
        self.exchange_calls
            .lock()
            .unwrap()
            .push((app_key.to_string(), app_token.to_string()));

        self.exchanges
            .lock()
            .unwrap()
            .get(&(app_key.to_string(), app_token.to_string()))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("invalid key/secret pair"))
    }

    async fn get_authenticated_user(
        &self,
        store_token: &str,
    ) -> Result<Option<AuthenticatedUser>> {
        Ok(self.store_users.lock().unwrap().get(store_token).cloned())
    }

    async fn check_license_permission(&self, token: &str, resource: &str) -> Result<bool> {
        Ok(self
            .license_grants
            .lock()
            .unwrap()
            .iter()
            .any(|(t, r)| t == token && r == resource))
    }
}

// =============================================================================
// Mock Permissions Service
// =============================================================================

pub struct MockPermissionsService {
    permission_set: Mutex<Option<PermissionSet>>,
    users: Mutex<HashMap<String, PermissionsUser>>,
    roles: Mutex<HashMap<String, RoleInfo>>,
    fail: Mutex<bool>,
    /// sender argument of each check_user_permission call
    check_calls: Mutex<Vec<String>>,
}

impl MockPermissionsService {
    pub fn new() -> Self {
        Self {
            permission_set: Mutex::new(None),
            users: Mutex::new(HashMap::new()),
            roles: Mutex::new(HashMap::new()),
            fail: Mutex::new(false),
            check_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_permission_set(self, role_id: &str, slug: &str, permissions: &[&str]) -> Self {
        *self.permission_set.lock().unwrap() = Some(PermissionSet {
            role: crate::common::auth::Role {
                id: role_id.to_string(),
                slug: slug.to_string(),
            },
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    pub fn with_b2b_user(self, id: &str, role_id: &str, org: &str, cost: &str) -> Self {
        self.users.lock().unwrap().insert(
            id.to_string(),
            PermissionsUser {
                id: id.to_string(),
                role_id: role_id.to_string(),
                org_id: Some(org.to_string()),
                cost_id: Some(cost.to_string()),
            },
        );
        self
    }

    pub fn with_role(self, id: &str, slug: &str) -> Self {
        self.roles.lock().unwrap().insert(
            id.to_string(),
            RoleInfo {
                id: id.to_string(),
                slug: slug.to_string(),
            },
        );
        self
    }

    pub fn failing(self) -> Self {
        *self.fail.lock().unwrap() = true;
        self
    }

    pub fn check_calls(&self) -> Vec<String> {
        self.check_calls.lock().unwrap().clone()
    }
}

impl Default for MockPermissionsService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePermissionsService for MockPermissionsService {
    async fn check_user_permission(
        &self,
        _store_token: Option<&str>,
        sender: &str,
    ) -> Result<Option<PermissionSet>> {
        self.check_calls.lock().unwrap().push(sender.to_string());

        if *self.fail.lock().unwrap() {
            anyhow::bail!("permissions service unavailable");
        }

        Ok(self.permission_set.lock().unwrap().clone())
    }

    async fn get_role(&self, id: &str) -> Result<Option<RoleInfo>> {
        Ok(self.roles.lock().unwrap().get(id).cloned())
    }

    async fn get_b2b_user(&self, id: &str) -> Result<Option<PermissionsUser>> {
        Ok(self.users.lock().unwrap().get(id).cloned())
    }
}

// =============================================================================
// Mock Document Store
// =============================================================================

pub struct MockDocumentStore {
    /// entity -> rows returned by search
    search_rows: Mutex<HashMap<String, Vec<Value>>>,
    /// (entity, id) -> document returned by get
    documents: Mutex<HashMap<(String, String), Value>>,
    created: Mutex<Vec<(String, Value)>>,
    updated: Mutex<Vec<(String, String, Value)>>,
    search_calls: Mutex<Vec<SearchArgs>>,
    next_id: Mutex<u64>,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self {
            search_rows: Mutex::new(HashMap::new()),
            documents: Mutex::new(HashMap::new()),
            created: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
            search_calls: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
        }
    }

    pub fn with_search_rows(self, entity: &str, rows: Vec<Value>) -> Self {
        self.search_rows
            .lock()
            .unwrap()
            .insert(entity.to_string(), rows);
        self
    }

    pub fn with_document(self, entity: &str, id: &str, doc: Value) -> Self {
        self.documents
            .lock()
            .unwrap()
            .insert((entity.to_string(), id.to_string()), doc);
        self
    }

    pub fn created_documents(&self) -> Vec<(String, Value)> {
        self.created.lock().unwrap().clone()
    }

    pub fn updated_documents(&self) -> Vec<(String, String, Value)> {
        self.updated.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> Vec<SearchArgs> {
        self.search_calls.lock().unwrap().clone()
    }
}

impl Default for MockDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseDocumentStore for MockDocumentStore {
    async fn create_document(&self, entity: &str, body: Value) -> Result<String> {
        self.created
            .lock()
            .unwrap()
            .push((entity.to_string(), body));

        let mut next = self.next_id.lock().unwrap();
        let id = format!("doc-{}", *next);
        *next += 1;
        Ok(id)
    }

    async fn get_document(
        &self,
        entity: &str,
        id: &str,
        _fields: &[&str],
    ) -> Result<Option<Value>> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .get(&(entity.to_string(), id.to_string()))
            .cloned())
    }

    async fn update_document(&self, entity: &str, id: &str, body: Value) -> Result<()> {
        self.updated
            .lock()
            .unwrap()
            .push((entity.to_string(), id.to_string(), body));
        Ok(())
    }

    async fn delete_document(&self, entity: &str, id: &str) -> Result<()> {
        self.documents
            .lock()
            .unwrap()
            .remove(&(entity.to_string(), id.to_string()));
        Ok(())
    }

    async fn search_documents(&self, args: &SearchArgs) -> Result<Vec<Value>> {
        self.search_calls.lock().unwrap().push(args.clone());

        Ok(self
            .search_rows
            .lock()
            .unwrap()
            .get(&args.entity)
            .cloned()
            .unwrap_or_default())
    }
}

// =============================================================================
// Mock Analytics / Audit / Mail
// =============================================================================

pub struct MockAnalyticsChannel {
    metrics: Mutex<Vec<AuthMetric>>,
    fail: Mutex<bool>,
}

impl MockAnalyticsChannel {
    pub fn new() -> Self {
        Self {
            metrics: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
        }
    }

    pub fn failing(self) -> Self {
        *self.fail.lock().unwrap() = true;
        self
    }

    pub fn sent_metrics(&self) -> Vec<AuthMetric> {
        self.metrics.lock().unwrap().clone()
    }
}

impl Default for MockAnalyticsChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAnalyticsChannel for MockAnalyticsChannel {
    async fn send_metric(&self, metric: &AuthMetric) -> Result<()> {
        self.metrics.lock().unwrap().push(metric.clone());

        if *self.fail.lock().unwrap() {
            anyhow::bail!("analytics unavailable");
        }
        Ok(())
    }
}

pub struct MockAuditChannel {
    events: Mutex<Vec<AuditEvent>>,
}

impl MockAuditChannel {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn sent_events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Default for MockAuditChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAuditChannel for MockAuditChannel {
    async fn send_event(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct MockMailService {
    sent: Mutex<Vec<(String, String)>>,
    fail: Mutex<bool>,
}

impl MockMailService {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
        }
    }

    pub fn failing(self) -> Self {
        *self.fail.lock().unwrap() = true;
        self
    }

    /// (template, recipient) pairs in send order
    pub fn sent_mail(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for MockMailService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseMailService for MockMailService {
    async fn send_template(&self, template: &str, to: &str, _data: Value) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((template.to_string(), to.to_string()));

        if *self.fail.lock().unwrap() {
            anyhow::bail!("mail service unavailable");
        }
        Ok(())
    }
}

// =============================================================================
// TestDeps bundle
// =============================================================================

/// Pre-wired mock dependency set; tests keep the Arcs to assert on captures
pub struct TestDeps {
    pub identity: Arc<MockIdentityAuthority>,
    pub permissions: Arc<MockPermissionsService>,
    pub documents: Arc<MockDocumentStore>,
    pub analytics: Arc<MockAnalyticsChannel>,
    pub audit: Arc<MockAuditChannel>,
    pub mail: Arc<MockMailService>,
}

impl TestDeps {
    pub fn new() -> Self {
        Self {
            identity: Arc::new(MockIdentityAuthority::new()),
            permissions: Arc::new(MockPermissionsService::new()),
            documents: Arc::new(MockDocumentStore::new()),
            analytics: Arc::new(MockAnalyticsChannel::new()),
            audit: Arc::new(MockAuditChannel::new()),
            mail: Arc::new(MockMailService::new()),
        }
    }

    pub fn with_identity(mut self, identity: MockIdentityAuthority) -> Self {
        self.identity = Arc::new(identity);
        self
    }

    pub fn with_permissions(mut self, permissions: MockPermissionsService) -> Self {
        self.permissions = Arc::new(permissions);
        self
    }

    pub fn with_documents(mut self, documents: MockDocumentStore) -> Self {
        self.documents = Arc::new(documents);
        self
    }

    pub fn with_analytics(mut self, analytics: MockAnalyticsChannel) -> Self {
        self.analytics = Arc::new(analytics);
        self
    }

    pub fn with_mail(mut self, mail: MockMailService) -> Self {
        self.mail = Arc::new(mail);
        self
    }

    pub fn build(&self) -> ServerDeps {
        ServerDeps::new(
            self.identity.clone(),
            self.permissions.clone(),
            self.documents.clone(),
            self.analytics.clone(),
            self.audit.clone(),
            self.mail.clone(),
            "test-account".to_string(),
            "b2b-organizations-graphql".to_string(),
        )
    }
}

impl Default for TestDeps {
    fn default() -> Self {
        Self::new()
    }
}
