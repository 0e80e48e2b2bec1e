//! Permission resolution for storefront callers.
//!
//! Resolved at most once per request and memoized on the session; downstream
//! field resolvers and the audit sink reuse the memo.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::session::{RequestSession, SENDER_APP_HEADER};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub slug: String,
}

/// Effective role + permission set of a storefront caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub role: Role,
    pub permissions: Vec<String>,
}

impl PermissionSet {
    pub fn has(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Sender application used to scope the permission check.
///
/// Precedence: persisted-query sender from GraphQL extensions, then the
/// caller-app header, then this service's own app id. The order is pinned by
/// tests; do not reorder.
pub fn resolve_sender(session: &RequestSession, own_app: &str) -> String {
    if let Some(sender) = session.sender_app().filter(|s| !s.is_empty()) {
        return sender.to_string();
    }
    if let Some(sender) = session.header(SENDER_APP_HEADER).filter(|s| !s.is_empty()) {
        return sender.to_string();
    }
    own_app.to_string()
}

/// Resolve the caller's permission set, memoized on the request session.
///
/// Any service error folds to None. The miss is logged as an error only when
/// an admin token was present; for anonymous storefront traffic the absence
/// is expected.
pub async fn get_user_permission(
    deps: &ServerDeps,
    session: &RequestSession,
) -> Option<PermissionSet> {
    if let Some(memo) = session.permission_memo() {
        return memo;
    }

    let sender = resolve_sender(session, &deps.app_id);
    let store_token = session.store_token();

    let resolved = match deps
        .permissions
        .check_user_permission(store_token.as_deref(), &sender)
        .await
    {
        Ok(set) => set,
        Err(e) => {
            if session.admin_token().is_some() {
                error!(error = %e, sender = %sender, "Failed to resolve user permissions");
            } else {
                debug!(error = %e, sender = %sender, "No user permissions resolved");
            }
            None
        }
    };

    session.memoize_permissions(resolved.clone());
    resolved
}

/// Sales admins may see across organizations (e.g. list all organizations)
pub fn is_sales_admin(permissions: &PermissionSet) -> bool {
    permissions.role.slug.contains("sales-admin")
}

/// Role slug of a target B2B user, looked up through the permissions service.
/// Used by the scope matcher's sales carve-outs. Errors fold to None.
pub async fn target_role_slug(deps: &ServerDeps, user_id: &str) -> Option<String> {
    let user = match deps.permissions.get_b2b_user(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return None,
        Err(e) => {
            debug!(error = %e, user_id, "Target user lookup failed");
            return None;
        }
    };

    match deps.permissions.get_role(&user.role_id).await {
        Ok(Some(role)) => Some(role.slug),
        Ok(None) => None,
        Err(e) => {
            debug!(error = %e, role_id = %user.role_id, "Target role lookup failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{MockPermissionsService, TestDeps};

    #[test]
    fn sender_precedence_extensions_win() {
        let session = RequestSession::builder()
            .sender_app("ext-app")
            .header(SENDER_APP_HEADER, "header-app")
            .build();

        assert_eq!(resolve_sender(&session, "own-app"), "ext-app");
    }

    #[test]
    fn sender_precedence_header_beats_default() {
        let session = RequestSession::builder()
            .header(SENDER_APP_HEADER, "header-app")
            .build();

        assert_eq!(resolve_sender(&session, "own-app"), "header-app");
    }

    #[test]
    fn sender_precedence_falls_back_to_own_app() {
        let session = RequestSession::builder().build();
        assert_eq!(resolve_sender(&session, "own-app"), "own-app");
    }

    #[tokio::test]
    async fn permission_lookup_is_memoized_per_request() {
        let deps = TestDeps::new().with_permissions(
            MockPermissionsService::new().with_permission_set(
                "role-1",
                "organization-admin",
                &["add-users-organization"],
            ),
        );
        let server_deps = deps.build();
        let session = RequestSession::builder().store_token("store-tok").build();

        let first = get_user_permission(&server_deps, &session).await;
        let second = get_user_permission(&server_deps, &session).await;

        assert_eq!(first, second);
        assert_eq!(deps.permissions.check_calls().len(), 1);
    }

    #[tokio::test]
    async fn negative_resolution_is_memoized_too() {
        let deps = TestDeps::new().with_permissions(MockPermissionsService::new().failing());
        let server_deps = deps.build();
        let session = RequestSession::builder().build();

        assert_eq!(get_user_permission(&server_deps, &session).await, None);
        assert_eq!(get_user_permission(&server_deps, &session).await, None);
        assert_eq!(deps.permissions.check_calls().len(), 1);
    }

    #[test]
    fn sales_admin_matches_on_role_slug() {
        let set = PermissionSet {
            role: Role {
                id: "r".to_string(),
                slug: "customer-sales-admin".to_string(),
            },
            permissions: vec![],
        };
        assert!(is_sales_admin(&set));

        let set = PermissionSet {
            role: Role {
                id: "r".to_string(),
                slug: "organization-admin".to_string(),
            },
            permissions: vec![],
        };
        assert!(!is_sales_admin(&set));
    }
}
