//! GraphQL request context: shared dependencies plus the per-request session.
//!
//! Resolvers call the guard helpers here before touching data. The helpers
//! return the credential path that satisfied the chain so storefront callers
//! (store-token path) can be held to their organizational scope while
//! admin-class callers pass through.

use std::sync::Arc;

use crate::common::auth::{
    check_admin_access, check_user_access, check_user_operation, get_user_permission,
    is_sales_admin, validate_admin_user_access, validate_store_user_access, AuthError,
    CredentialStrategy, DenialReason, LicensePermission, OperationTarget, RequestSession,
    ScopeContext, UserOperation,
};
use crate::kernel::ServerDeps;

#[derive(Clone)]
pub struct GraphQLContext {
    deps: ServerDeps,
    session: Arc<RequestSession>,
}

impl juniper::Context for GraphQLContext {}

impl GraphQLContext {
    pub fn new(deps: ServerDeps, session: Arc<RequestSession>) -> Self {
        Self { deps, session }
    }

    pub fn deps(&self) -> &ServerDeps {
        &self.deps
    }

    pub fn session(&self) -> &RequestSession {
        &self.session
    }

    pub async fn check_admin_access(
        &self,
        operation: &str,
    ) -> Result<CredentialStrategy, AuthError> {
        check_admin_access(&self.deps, &self.session, operation).await
    }

    pub async fn check_user_access(
        &self,
        operation: &str,
    ) -> Result<CredentialStrategy, AuthError> {
        check_user_access(&self.deps, &self.session, operation).await
    }

    pub async fn validate_admin_user_access(
        &self,
        operation: &str,
        permission: LicensePermission,
    ) -> Result<CredentialStrategy, AuthError> {
        validate_admin_user_access(&self.deps, &self.session, operation, permission).await
    }

    pub async fn validate_store_user_access(
        &self,
        operation: &str,
    ) -> Result<CredentialStrategy, AuthError> {
        validate_store_user_access(&self.deps, &self.session, operation).await
    }

    /// Whether the storefront caller holds a sales-admin role; used to gate
    /// cross-organization visibility
    pub async fn caller_is_sales_admin(&self) -> bool {
        get_user_permission(&self.deps, &self.session)
            .await
            .as_ref()
            .map(is_sales_admin)
            .unwrap_or(false)
    }

    /// Hold a store-token caller to its own organization. Admin-class
    /// credential paths pass through.
    pub async fn require_organization_scope(
        &self,
        path: CredentialStrategy,
        organization_id: &str,
    ) -> Result<(), AuthError> {
        if path != CredentialStrategy::StoreToken {
            return Ok(());
        }
        if self.caller_is_sales_admin().await {
            return Ok(());
        }

        let scope = ScopeContext::from_session(&self.session)?;
        if scope.organization_id != organization_id {
            return Err(AuthError::Denied(DenialReason::OperationNotPermitted));
        }
        Ok(())
    }

    /// Run a store-token caller through the scope matcher for one user
    /// operation. Admin-class credential paths pass through.
    pub async fn require_user_operation(
        &self,
        path: CredentialStrategy,
        operation: UserOperation,
        target: &OperationTarget,
    ) -> Result<(), AuthError> {
        if path != CredentialStrategy::StoreToken {
            return Ok(());
        }

        let permissions = get_user_permission(&self.deps, &self.session)
            .await
            .ok_or(AuthError::Denied(DenialReason::OperationNotPermitted))?;

        check_user_operation(&self.deps, &self.session, &permissions, operation, target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{MockPermissionsService, TestDeps};

    fn context(deps: &TestDeps, session: RequestSession) -> GraphQLContext {
        GraphQLContext::new(deps.build(), Arc::new(session))
    }

    #[tokio::test]
    async fn admin_paths_bypass_organization_scoping() {
        let deps = TestDeps::new();
        let ctx = context(&deps, RequestSession::builder().build());

        for path in [
            CredentialStrategy::ContextAdminToken,
            CredentialStrategy::HeaderAdminToken,
            CredentialStrategy::ApiKeyPair,
        ] {
            assert!(ctx.require_organization_scope(path, "org-z").await.is_ok());
        }
    }

    #[tokio::test]
    async fn store_path_is_held_to_its_own_organization() {
        let deps = TestDeps::new();
        let session = RequestSession::builder()
            .store_token("store-tok")
            .organization("org-a")
            .build();
        let ctx = context(&deps, session);

        assert!(ctx
            .require_organization_scope(CredentialStrategy::StoreToken, "org-a")
            .await
            .is_ok());

        let result = ctx
            .require_organization_scope(CredentialStrategy::StoreToken, "org-b")
            .await;
        assert!(matches!(
            result,
            Err(AuthError::Denied(DenialReason::OperationNotPermitted))
        ));
    }

    #[tokio::test]
    async fn sales_admin_sees_across_organizations() {
        let deps = TestDeps::new().with_permissions(
            MockPermissionsService::new().with_permission_set(
                "role-1",
                "customer-sales-admin",
                &[],
            ),
        );
        let session = RequestSession::builder()
            .store_token("store-tok")
            .organization("org-a")
            .build();
        let ctx = context(&deps, session);

        assert!(ctx
            .require_organization_scope(CredentialStrategy::StoreToken, "org-b")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn store_path_without_organization_namespace_is_denied() {
        let deps = TestDeps::new();
        let session = RequestSession::builder().store_token("store-tok").build();
        let ctx = context(&deps, session);

        let result = ctx
            .require_organization_scope(CredentialStrategy::StoreToken, "org-a")
            .await;
        assert!(matches!(
            result,
            Err(AuthError::Denied(DenialReason::OrganizationDataNotFound))
        ));
    }

    #[tokio::test]
    async fn admin_paths_bypass_the_user_operation_matcher() {
        let deps = TestDeps::new();
        let ctx = context(&deps, RequestSession::builder().build());
        let target = OperationTarget::default();

        let result = ctx
            .require_user_operation(
                CredentialStrategy::ApiKeyPair,
                UserOperation::RemoveUser,
                &target,
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn store_path_without_permissions_cannot_run_user_operations() {
        let deps = TestDeps::new();
        let session = RequestSession::builder()
            .store_token("store-tok")
            .organization("org-a")
            .build();
        let ctx = context(&deps, session);
        let target = OperationTarget::default();

        let result = ctx
            .require_user_operation(
                CredentialStrategy::StoreToken,
                UserOperation::RemoveUser,
                &target,
            )
            .await;
        assert!(matches!(
            result,
            Err(AuthError::Denied(DenialReason::OperationNotPermitted))
        ));
    }
}
