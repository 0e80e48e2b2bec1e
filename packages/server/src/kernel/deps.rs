//! Server dependencies (using traits for testability)
//!
//! Central dependency container handed to the guard chain and to domain
//! actions. All external platform services sit behind trait objects so tests
//! can substitute the mocks in `test_dependencies`.

use std::sync::Arc;

use crate::kernel::{
    BaseAnalyticsChannel, BaseAuditChannel, BaseDocumentStore, BaseIdentityAuthority,
    BaseMailService, BasePermissionsService,
};

/// Server dependencies accessible to guards and domain actions
#[derive(Clone)]
pub struct ServerDeps {
    pub identity: Arc<dyn BaseIdentityAuthority>,
    pub permissions: Arc<dyn BasePermissionsService>,
    pub documents: Arc<dyn BaseDocumentStore>,
    pub analytics: Arc<dyn BaseAnalyticsChannel>,
    pub audit: Arc<dyn BaseAuditChannel>,
    pub mail: Arc<dyn BaseMailService>,
    /// Platform account (tenant) this service runs under
    pub account: String,
    /// This service's own app identifier (default permission-check sender)
    pub app_id: String,
}

impl ServerDeps {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identity: Arc<dyn BaseIdentityAuthority>,
        permissions: Arc<dyn BasePermissionsService>,
        documents: Arc<dyn BaseDocumentStore>,
        analytics: Arc<dyn BaseAnalyticsChannel>,
        audit: Arc<dyn BaseAuditChannel>,
        mail: Arc<dyn BaseMailService>,
        account: String,
        app_id: String,
    ) -> Self {
        Self {
            identity,
            permissions,
            documents,
            analytics,
            audit,
            mail,
            account,
            app_id,
        }
    }
}
