//! Identity validation: checks each credential kind against the identity
//! authority. Every sub-check fails closed: absence of proof is denial, not
//! a fault, so external-call failures fold into `false` and log at warn.

use tracing::warn;

use super::credentials::api_key_pair;
use super::session::{RequestSession, ADMIN_SESSION_COOKIE};
use crate::kernel::{SearchArgs, ServerDeps};

/// Audience the identity authority reports for back-office tokens
pub const ADMIN_AUDIENCE: &str = "admin";

/// Document-store entity holding B2B user membership records
pub const B2B_USERS_ENTITY: &str = "b2b_users";

/// Named license-manager permissions gating admin operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicensePermission {
    View,
    Edit,
}

impl LicensePermission {
    pub fn resource(&self) -> &'static str {
        match self {
            LicensePermission::View => "buyer_organization_view",
            LicensePermission::Edit => "buyer_organization_edit",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AdminTokenCheck {
    pub has_token: bool,
    pub has_valid_token: bool,
    pub has_valid_role: bool,
}

impl AdminTokenCheck {
    pub fn satisfied(&self) -> bool {
        self.has_valid_token && self.has_valid_role
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApiTokenCheck {
    pub has_api_token: bool,
    pub has_valid_api_token: bool,
    pub has_valid_api_role: bool,
}

impl ApiTokenCheck {
    pub fn satisfied(&self) -> bool {
        self.has_valid_api_token && self.has_valid_api_role
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreTokenCheck {
    pub has_store_token: bool,
    pub has_valid_store_token: bool,
}

/// Validate an admin-class token.
///
/// `has_valid_token` means the authority accepted it; `has_valid_role`
/// additionally requires the admin audience and, when given, the named
/// license-manager permission.
pub async fn validate_admin_token(
    deps: &ServerDeps,
    token: Option<&str>,
    required: Option<LicensePermission>,
) -> AdminTokenCheck {
    let mut check = AdminTokenCheck::default();

    let token = match token.filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => return check,
    };
    check.has_token = true;

    let claims = match deps.identity.validate_token(token).await {
        Ok(claims) => claims,
        Err(e) => {
            warn!(error = %e, "Admin token validation failed");
            return check;
        }
    };
    check.has_valid_token = true;

    if claims.audience != ADMIN_AUDIENCE {
        return check;
    }

    check.has_valid_role = match required {
        None => true,
        Some(permission) => deps
            .identity
            .check_license_permission(token, permission.resource())
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, resource = permission.resource(), "License permission check failed");
                false
            }),
    };

    check
}

/// Exchange the request's API key/secret pair for a token and run the admin
/// check on it. On success the exchanged token is promoted: written into the
/// cookie jar and bound to the session's admin slot, so later guards in the
/// same request see a first-class admin credential (one exchange per request).
pub async fn validate_api_token(
    deps: &ServerDeps,
    session: &RequestSession,
    required: Option<LicensePermission>,
) -> ApiTokenCheck {
    let mut check = ApiTokenCheck::default();

    let (key, secret) = match api_key_pair(session) {
        Some(pair) => pair,
        None => return check,
    };
    check.has_api_token = true;

    let token = match deps.identity.get_token(&key, &secret).await {
        Ok(token) => token,
        Err(e) => {
            warn!(error = %e, "API token exchange failed");
            return check;
        }
    };

    let admin = validate_admin_token(deps, Some(&token), required).await;
    check.has_valid_api_token = admin.has_valid_token;
    check.has_valid_api_role = admin.has_valid_role;

    if check.satisfied() {
        session.set_cookie(ADMIN_SESSION_COOKIE, &token);
        session.set_admin_token(&token);
    }

    check
}

/// Validate a storefront session token. Beyond authentication, the resolved
/// user must belong to at least one buyer organization; a store account with
/// no B2B membership is not a valid credential for this system.
pub async fn validate_store_token(deps: &ServerDeps, token: Option<&str>) -> StoreTokenCheck {
    let mut check = StoreTokenCheck::default();

    let token = match token.filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => return check,
    };
    check.has_store_token = true;

    let user = match deps.identity.get_authenticated_user(token).await {
        Ok(Some(user)) => user,
        Ok(None) => return check,
        Err(e) => {
            warn!(error = %e, "Store token validation failed");
            return check;
        }
    };

    let search = SearchArgs::new(B2B_USERS_ENTITY, &["id"])
        .with_filter(format!("email={}", user.email))
        .with_page(1, 1);

    check.has_valid_store_token = match deps.documents.search_documents(&search).await {
        Ok(rows) => !rows.is_empty(),
        Err(e) => {
            warn!(error = %e, email = %user.email, "Buyer organization membership check failed");
            false
        }
    };

    check
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{
        MockDocumentStore, MockIdentityAuthority, TestDeps,
    };

    #[tokio::test]
    async fn admin_token_requires_admin_audience() {
        let deps = TestDeps::new()
            .with_identity(
                MockIdentityAuthority::new().with_valid_token("tok", "store", "user@acme.com"),
            )
            .build();

        let check = validate_admin_token(&deps, Some("tok"), None).await;
        assert!(check.has_token);
        assert!(check.has_valid_token);
        assert!(!check.has_valid_role);
    }

    #[tokio::test]
    async fn authority_error_fails_closed() {
        let deps = TestDeps::new()
            .with_identity(MockIdentityAuthority::new().failing_validation())
            .build();

        let check = validate_admin_token(&deps, Some("tok"), None).await;
        assert!(check.has_token);
        assert!(!check.has_valid_token);
        assert!(!check.has_valid_role);
    }

    #[tokio::test]
    async fn license_permission_gates_valid_role() {
        let identity = MockIdentityAuthority::new()
            .with_valid_token("tok", "admin", "ops@acme.com")
            .with_license_grant("tok", "buyer_organization_view");
        let deps = TestDeps::new().with_identity(identity).build();

        let view = validate_admin_token(&deps, Some("tok"), Some(LicensePermission::View)).await;
        assert!(view.satisfied());

        let edit = validate_admin_token(&deps, Some("tok"), Some(LicensePermission::Edit)).await;
        assert!(edit.has_valid_token);
        assert!(!edit.has_valid_role);
    }

    #[tokio::test]
    async fn api_token_exchange_promotes_into_session() {
        let identity = MockIdentityAuthority::new()
            .with_exchange("key", "secret", "exchanged-tok")
            .with_valid_token("exchanged-tok", "admin", "machine@acme.com");
        let deps = TestDeps::new().with_identity(identity).build();
        let session = RequestSession::builder().api_key_pair("key", "secret").build();

        let check = validate_api_token(&deps, &session, None).await;

        assert!(check.satisfied());
        assert_eq!(session.admin_token().as_deref(), Some("exchanged-tok"));
        assert_eq!(
            session.cookie(ADMIN_SESSION_COOKIE).as_deref(),
            Some("exchanged-tok")
        );
    }

    #[tokio::test]
    async fn failed_exchange_does_not_touch_session() {
        let deps = TestDeps::new().build();
        let session = RequestSession::builder().api_key_pair("key", "wrong").build();

        let check = validate_api_token(&deps, &session, None).await;

        assert!(check.has_api_token);
        assert!(!check.has_valid_api_token);
        assert_eq!(session.admin_token(), None);
    }

    #[tokio::test]
    async fn store_token_requires_buyer_org_membership() {
        let identity =
            MockIdentityAuthority::new().with_store_user("store-tok", "u-1", "buyer@acme.com");

        // No b2b_users rows: authenticated but not a B2B user
        let deps = TestDeps::new().with_identity(identity).build();
        let check = validate_store_token(&deps, Some("store-tok")).await;
        assert!(check.has_store_token);
        assert!(!check.has_valid_store_token);

        let identity =
            MockIdentityAuthority::new().with_store_user("store-tok", "u-1", "buyer@acme.com");
        let documents = MockDocumentStore::new().with_search_rows(
            B2B_USERS_ENTITY,
            vec![serde_json::json!({ "id": "u-1" })],
        );
        let deps = TestDeps::new()
            .with_identity(identity)
            .with_documents(documents)
            .build();

        let check = validate_store_token(&deps, Some("store-tok")).await;
        assert!(check.has_valid_store_token);
    }
}
