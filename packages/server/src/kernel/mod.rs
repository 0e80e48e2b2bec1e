//! Kernel module - server infrastructure and dependencies.

pub mod analytics_client;
pub mod audit_client;
pub mod deps;
pub mod document_store_client;
pub mod identity_client;
pub mod mail_client;
pub mod permissions_client;
pub mod test_dependencies;
pub mod traits;

pub use analytics_client::AnalyticsClient;
pub use audit_client::AuditClient;
pub use deps::ServerDeps;
pub use document_store_client::DocumentStoreClient;
pub use identity_client::IdentityClient;
pub use mail_client::MailClient;
pub use permissions_client::PermissionsClient;
pub use traits::{
    AuditEvent, AuditMeta, AuthMetric, AuthenticatedUser, BaseAnalyticsChannel, BaseAuditChannel,
    BaseDocumentStore, BaseIdentityAuthority, BaseMailService, BasePermissionsService,
    PermissionsUser, RoleInfo, SearchArgs, TokenClaims,
};
