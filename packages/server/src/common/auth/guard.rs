//! Guard chain: per-field authorization applied before resolvers run.
//!
//! One parameterized runner over the request's extracted credentials; the
//! four guard variants configure which credential kinds it accepts. The chain
//! short-circuits at the first satisfied credential path, so an allow always
//! traces to exactly one credential. Every variant emits exactly one auth
//! metric per decision, on allow and deny alike, before returning or raising.

use serde::Serialize;

use super::audit::{send_auth_metric, AUTH_METRIC_KIND};
use super::credentials::{extract_credentials, Credential};
use super::errors::AuthError;
use super::identity::{
    validate_admin_token, validate_api_token, validate_store_token, LicensePermission,
};
use super::session::RequestSession;
use crate::kernel::{AuthMetric, ServerDeps};

/// One credential path the chain may try, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStrategy {
    ContextAdminToken,
    HeaderAdminToken,
    ApiKeyPair,
    StoreToken,
}

impl From<&Credential> for CredentialStrategy {
    fn from(credential: &Credential) -> Self {
        match credential {
            Credential::AdminToken(_) => CredentialStrategy::ContextAdminToken,
            Credential::HeaderAdminToken(_) => CredentialStrategy::HeaderAdminToken,
            Credential::ApiKeyPair { .. } => CredentialStrategy::ApiKeyPair,
            Credential::StoreToken(_) => CredentialStrategy::StoreToken,
        }
    }
}

/// Which credential kinds were present/valid, carried on the auth metric
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AuthChecks {
    pub has_admin_token: bool,
    pub has_valid_admin_token: bool,
    pub has_header_token: bool,
    pub has_valid_header_token: bool,
    pub has_api_token: bool,
    pub has_valid_api_token: bool,
    pub has_store_token: bool,
    pub has_valid_store_token: bool,
}

impl AuthChecks {
    fn any_present(&self) -> bool {
        self.has_admin_token || self.has_header_token || self.has_api_token || self.has_store_token
    }
}

struct GuardChain<'a> {
    deps: &'a ServerDeps,
    session: &'a RequestSession,
    /// Credential kinds this guard accepts; extraction fixes the priority
    strategies: &'a [CredentialStrategy],
    required_permission: Option<LicensePermission>,
    /// Invalidate the context admin binding when the header-token phase fails
    /// (store-access guard only; see DESIGN.md on the asymmetry)
    clear_admin_on_header_failure: bool,
}

impl GuardChain<'_> {
    /// Extract the request's credentials once, then validate the ones this
    /// guard accepts in extraction order. The first satisfied one wins, so an
    /// allow is traceable to exactly one credential path.
    async fn run(&self) -> (Result<CredentialStrategy, AuthError>, AuthChecks) {
        let mut checks = AuthChecks::default();
        let mut winner: Option<CredentialStrategy> = None;

        for credential in extract_credentials(self.session) {
            let strategy = CredentialStrategy::from(&credential);
            if !self.strategies.contains(&strategy) {
                continue;
            }

            let satisfied = match &credential {
                Credential::AdminToken(token) => {
                    let check =
                        validate_admin_token(self.deps, Some(token), self.required_permission)
                            .await;
                    checks.has_admin_token = true;
                    checks.has_valid_admin_token = check.satisfied();
                    check.satisfied()
                }
                Credential::HeaderAdminToken(token) => {
                    let check =
                        validate_admin_token(self.deps, Some(token), self.required_permission)
                            .await;
                    checks.has_header_token = true;
                    checks.has_valid_header_token = check.satisfied();

                    if check.satisfied() {
                        // Promote the winning header token into the context slot
                        self.session.set_admin_token(token);
                    } else if self.clear_admin_on_header_failure {
                        self.session.clear_admin_token();
                    }
                    check.satisfied()
                }
                Credential::ApiKeyPair { .. } => {
                    let check =
                        validate_api_token(self.deps, self.session, self.required_permission)
                            .await;
                    checks.has_api_token = true;
                    checks.has_valid_api_token = check.satisfied();
                    check.satisfied()
                }
                Credential::StoreToken(token) => {
                    let check = validate_store_token(self.deps, Some(token)).await;
                    checks.has_store_token = true;
                    checks.has_valid_store_token = check.has_valid_store_token;
                    check.has_valid_store_token
                }
            };

            if satisfied {
                winner = Some(strategy);
                break;
            }
        }

        let decision = match winner {
            Some(strategy) => Ok(strategy),
            None if checks.any_present() => Err(AuthError::Forbidden),
            None => Err(AuthError::Unauthenticated),
        };

        (decision, checks)
    }
}

async fn run_guard(
    deps: &ServerDeps,
    session: &RequestSession,
    operation: &str,
    guard: &str,
    strategies: &[CredentialStrategy],
    required_permission: Option<LicensePermission>,
    clear_admin_on_header_failure: bool,
) -> Result<CredentialStrategy, AuthError> {
    let chain = GuardChain {
        deps,
        session,
        strategies,
        required_permission,
        clear_admin_on_header_failure,
    };
    let (decision, checks) = chain.run().await;

    let status = decision.as_ref().err().map(AuthError::status);
    let metric = AuthMetric {
        account: deps.account.clone(),
        kind: AUTH_METRIC_KIND.to_string(),
        description: format!(
            "{} {} for {}",
            guard,
            if decision.is_ok() { "allowed" } else { "denied" },
            operation
        ),
        fields: serde_json::json!({
            "operation": operation,
            "guard": guard,
            "allowed": decision.is_ok(),
            "checks": checks,
        }),
    };

    // The metric must go out on every branch, before any raise
    send_auth_metric(deps, session, operation, metric, status).await;

    decision
}

/// Requires a validated admin-class credential; no storefront fallback.
/// Returns the credential path that satisfied the chain.
pub async fn check_admin_access(
    deps: &ServerDeps,
    session: &RequestSession,
    operation: &str,
) -> Result<CredentialStrategy, AuthError> {
    run_guard(
        deps,
        session,
        operation,
        "check-admin-access",
        &[
            CredentialStrategy::ContextAdminToken,
            CredentialStrategy::HeaderAdminToken,
            CredentialStrategy::ApiKeyPair,
        ],
        None,
        false,
    )
    .await
}

/// Requires any recognized caller: admin-class or store-class. No scoping.
pub async fn check_user_access(
    deps: &ServerDeps,
    session: &RequestSession,
    operation: &str,
) -> Result<CredentialStrategy, AuthError> {
    run_guard(
        deps,
        session,
        operation,
        "check-user-access",
        &[
            CredentialStrategy::ContextAdminToken,
            CredentialStrategy::HeaderAdminToken,
            CredentialStrategy::ApiKeyPair,
            CredentialStrategy::StoreToken,
        ],
        None,
        false,
    )
    .await
}

/// Like check_admin_access, but the winning path must also carry the named
/// license-manager permission
pub async fn validate_admin_user_access(
    deps: &ServerDeps,
    session: &RequestSession,
    operation: &str,
    permission: LicensePermission,
) -> Result<CredentialStrategy, AuthError> {
    run_guard(
        deps,
        session,
        operation,
        "validate-admin-user-access",
        &[
            CredentialStrategy::ContextAdminToken,
            CredentialStrategy::HeaderAdminToken,
            CredentialStrategy::ApiKeyPair,
        ],
        Some(permission),
        false,
    )
    .await
}

/// Admin chain first, store token as the clean fallback. A failed header
/// phase invalidates the context admin binding before falling through.
pub async fn validate_store_user_access(
    deps: &ServerDeps,
    session: &RequestSession,
    operation: &str,
) -> Result<CredentialStrategy, AuthError> {
    run_guard(
        deps,
        session,
        operation,
        "validate-store-user-access",
        &[
            CredentialStrategy::ContextAdminToken,
            CredentialStrategy::HeaderAdminToken,
            CredentialStrategy::ApiKeyPair,
            CredentialStrategy::StoreToken,
        ],
        None,
        true,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::auth::identity::B2B_USERS_ENTITY;
    use crate::kernel::test_dependencies::{
        MockAnalyticsChannel, MockDocumentStore, MockIdentityAuthority, TestDeps,
    };

    fn admin_identity(token: &str) -> MockIdentityAuthority {
        MockIdentityAuthority::new().with_valid_token(token, "admin", "ops@acme.com")
    }

    #[tokio::test]
    async fn no_credentials_is_unauthenticated() {
        let deps = TestDeps::new();
        let server_deps = deps.build();
        let session = RequestSession::builder().build();

        let result = check_admin_access(&server_deps, &session, "getOrganizations").await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));

        // The denial still emitted exactly one metric
        assert_eq!(deps.analytics.sent_metrics().len(), 1);
    }

    #[tokio::test]
    async fn invalid_credential_is_forbidden_not_unauthenticated() {
        let deps = TestDeps::new();
        let server_deps = deps.build();
        let session = RequestSession::builder().admin_token("unknown").build();

        let result = check_admin_access(&server_deps, &session, "getOrganizations").await;
        assert!(matches!(result, Err(AuthError::Forbidden)));
    }

    #[tokio::test]
    async fn half_empty_api_pair_is_not_a_credential() {
        let deps = TestDeps::new();
        let server_deps = deps.build();
        // Extraction requires both halves, so the chain never sees the pair
        // and the request counts as carrying no credentials at all
        let session = RequestSession::builder().api_key_pair("key", "").build();

        let result = check_user_access(&server_deps, &session, "getCostCenters").await;
        assert!(matches!(result, Err(AuthError::Unauthenticated)));
    }

    #[tokio::test]
    async fn authority_outage_denies_without_propagating() {
        let deps = TestDeps::new()
            .with_identity(MockIdentityAuthority::new().failing_validation());
        let server_deps = deps.build();
        let session = RequestSession::builder().admin_token("tok").build();

        let result = check_admin_access(&server_deps, &session, "getOrganizations").await;
        assert!(matches!(result, Err(AuthError::Forbidden)));
    }

    #[tokio::test]
    async fn valid_header_token_wins_and_is_promoted() {
        // Context token present but invalid; header token valid with the
        // required license permission
        let identity = MockIdentityAuthority::new()
            .with_valid_token("header-tok", "admin", "ops@acme.com")
            .with_license_grant("header-tok", "buyer_organization_view");
        let deps = TestDeps::new().with_identity(identity);
        let server_deps = deps.build();
        let session = RequestSession::builder()
            .admin_token("stale-tok")
            .header_admin_token("header-tok")
            .build();

        let result = validate_admin_user_access(
            &server_deps,
            &session,
            "getOrganizationById",
            LicensePermission::View,
        )
        .await;

        assert!(matches!(result, Ok(CredentialStrategy::HeaderAdminToken)));
        assert_eq!(session.admin_token().as_deref(), Some("header-tok"));
    }

    #[tokio::test]
    async fn admin_guard_keeps_context_token_on_header_failure() {
        let deps = TestDeps::new();
        let server_deps = deps.build();
        let session = RequestSession::builder()
            .admin_token("stale-tok")
            .header_admin_token("bad-header")
            .build();

        let result = validate_admin_user_access(
            &server_deps,
            &session,
            "getOrganizationById",
            LicensePermission::View,
        )
        .await;

        assert!(matches!(result, Err(AuthError::Forbidden)));
        // Asymmetry with the store guard: the context binding survives
        assert_eq!(session.admin_token().as_deref(), Some("stale-tok"));
    }

    #[tokio::test]
    async fn store_guard_clears_admin_binding_on_header_failure() {
        let identity = MockIdentityAuthority::new()
            .with_store_user("store-tok", "u-1", "buyer@acme.com");
        let documents = MockDocumentStore::new().with_search_rows(
            B2B_USERS_ENTITY,
            vec![serde_json::json!({ "id": "u-1" })],
        );
        let deps = TestDeps::new()
            .with_identity(identity)
            .with_documents(documents);
        let server_deps = deps.build();
        let session = RequestSession::builder()
            .admin_token("stale-tok")
            .header_admin_token("bad-header")
            .store_token("store-tok")
            .build();

        let result =
            validate_store_user_access(&server_deps, &session, "getCostCenters").await;

        assert!(matches!(result, Ok(CredentialStrategy::StoreToken)));
        // The failed header phase invalidated the context binding before the
        // store token won as the clean fallback
        assert_eq!(session.admin_token(), None);
    }

    #[tokio::test]
    async fn store_class_credential_satisfies_user_access() {
        let identity = MockIdentityAuthority::new()
            .with_store_user("store-tok", "u-1", "buyer@acme.com");
        let documents = MockDocumentStore::new().with_search_rows(
            B2B_USERS_ENTITY,
            vec![serde_json::json!({ "id": "u-1" })],
        );
        let deps = TestDeps::new()
            .with_identity(identity)
            .with_documents(documents);
        let server_deps = deps.build();
        let session = RequestSession::builder().store_token("store-tok").build();

        let result = check_user_access(&server_deps, &session, "getCostCenters").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn store_account_without_membership_is_denied() {
        let identity = MockIdentityAuthority::new()
            .with_store_user("store-tok", "u-1", "shopper@acme.com");
        let deps = TestDeps::new().with_identity(identity);
        let server_deps = deps.build();
        let session = RequestSession::builder().store_token("store-tok").build();

        let result = check_user_access(&server_deps, &session, "getCostCenters").await;
        assert!(matches!(result, Err(AuthError::Forbidden)));
    }

    #[tokio::test]
    async fn api_token_is_exchanged_once_across_guards() {
        let identity = MockIdentityAuthority::new()
            .with_exchange("key", "secret", "exchanged-tok")
            .with_valid_token("exchanged-tok", "admin", "machine@acme.com");
        let deps = TestDeps::new().with_identity(identity);
        let server_deps = deps.build();
        let session = RequestSession::builder().api_key_pair("key", "secret").build();

        let first = validate_store_user_access(&server_deps, &session, "getUsers").await;
        assert!(first.is_ok());
        assert_eq!(session.admin_token().as_deref(), Some("exchanged-tok"));

        // A later guard in the same request sees the promoted token and never
        // re-exchanges
        let second = check_admin_access(&server_deps, &session, "addUser").await;
        assert!(second.is_ok());
        assert_eq!(deps.identity.exchange_calls().len(), 1);
    }

    #[tokio::test]
    async fn every_decision_emits_exactly_one_metric() {
        let deps = TestDeps::new().with_identity(admin_identity("tok"));
        let server_deps = deps.build();

        let allowed_session = RequestSession::builder().admin_token("tok").build();
        check_admin_access(&server_deps, &allowed_session, "getOrganizations")
            .await
            .unwrap();
        assert_eq!(deps.analytics.sent_metrics().len(), 1);

        let denied_session = RequestSession::builder().admin_token("bad").build();
        let result = check_admin_access(&server_deps, &denied_session, "getOrganizations").await;
        assert!(result.is_err());
        assert_eq!(deps.analytics.sent_metrics().len(), 2);

        // Denials land an audit event as well; allows do not
        assert_eq!(deps.audit.sent_events().len(), 1);
    }

    #[tokio::test]
    async fn metric_failure_does_not_alter_the_decision() {
        let deps = TestDeps::new()
            .with_identity(admin_identity("tok"))
            .with_analytics(MockAnalyticsChannel::new().failing());
        let server_deps = deps.build();
        let session = RequestSession::builder().admin_token("tok").build();

        let result = check_admin_access(&server_deps, &session, "getOrganizations").await;
        assert!(result.is_ok());
    }
}
