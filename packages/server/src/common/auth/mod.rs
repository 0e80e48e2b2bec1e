//! Authorization decision engine.
//!
//! Layered trust evaluation applied per GraphQL field: credential extraction,
//! identity validation against the authority, permission resolution, scope
//! matching, and the guard chain tying them together. Every decision emits an
//! audit/metric side effect that can never alter the outcome.

pub mod audit;
pub mod credentials;
pub mod errors;
pub mod guard;
pub mod identity;
pub mod permissions;
pub mod scope;
pub mod session;

pub use audit::{audit_names, send_auth_metric, AuditNames, AUTH_METRIC_KIND};
pub use credentials::{api_key_pair, extract_credentials, Credential};
pub use errors::{AuthError, DenialReason};
pub use guard::{
    check_admin_access, check_user_access, validate_admin_user_access,
    validate_store_user_access, AuthChecks, CredentialStrategy,
};
pub use identity::{
    validate_admin_token, validate_api_token, validate_store_token, AdminTokenCheck,
    ApiTokenCheck, LicensePermission, StoreTokenCheck, ADMIN_AUDIENCE, B2B_USERS_ENTITY,
};
pub use permissions::{
    get_user_permission, is_sales_admin, resolve_sender, target_role_slug, PermissionSet, Role,
};
pub use scope::{check_user_operation, OperationTarget, ScopeContext, UserOperation};
pub use session::{
    RequestSession, RequestSessionBuilder, SessionNamespaces, ADMIN_SESSION_COOKIE,
    API_APP_KEY_HEADER, API_APP_TOKEN_HEADER, SENDER_APP_HEADER, STORE_SESSION_COOKIE,
};
