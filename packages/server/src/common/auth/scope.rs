//! Scope matching: may this caller run this operation against that target?
//!
//! Rules are applied in order: coarse "all" grant, organization-scoped grant,
//! cost-center-scoped grant, deny. User-management grants carry sales
//! carve-outs on the target's role slug.

use super::errors::{AuthError, DenialReason};
use super::permissions::{target_role_slug, PermissionSet};
use super::session::RequestSession;
use crate::kernel::ServerDeps;

/// The caller's own organizational scope, from the session namespaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeContext {
    pub organization_id: String,
    pub cost_center_id: Option<String>,
}

impl ScopeContext {
    /// Extract the caller scope once per evaluation. A missing organization
    /// namespace is its own denial reason, distinct from a scope mismatch.
    pub fn from_session(session: &RequestSession) -> Result<Self, AuthError> {
        let namespaces = session.namespaces();

        let organization_id = namespaces
            .organization
            .clone()
            .filter(|o| !o.is_empty())
            .ok_or(AuthError::Denied(DenialReason::OrganizationDataNotFound))?;

        Ok(Self {
            organization_id,
            cost_center_id: namespaces.cost_center.clone().filter(|c| !c.is_empty()),
        })
    }
}

/// Operation families the scope matcher understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOperation {
    AddUser,
    RemoveUser,
    ImpersonateUser,
}

impl UserOperation {
    /// Coarse grant allowing the operation across organizations
    fn all_grant(&self) -> &'static str {
        match self {
            UserOperation::AddUser => "add-sales-users-all",
            UserOperation::RemoveUser => "remove-sales-users-all",
            UserOperation::ImpersonateUser => "impersonate-users-all",
        }
    }

    fn organization_grant(&self) -> &'static str {
        match self {
            UserOperation::AddUser => "add-users-organization",
            UserOperation::RemoveUser => "remove-users-organization",
            UserOperation::ImpersonateUser => "impersonate-users-organization",
        }
    }

    fn cost_center_grant(&self) -> Option<&'static str> {
        match self {
            UserOperation::ImpersonateUser => Some("impersonate-users-costcenter"),
            _ => None,
        }
    }

    /// Whether the target's role slug gates the grants: org-scoped grants
    /// manage only non-sales users, the "all" grant only sales users
    fn sales_gated(&self) -> bool {
        matches!(self, UserOperation::AddUser | UserOperation::RemoveUser)
    }
}

/// The resource an operation acts on
#[derive(Debug, Clone, Default)]
pub struct OperationTarget {
    /// Target user id; used to resolve the role slug when not supplied
    pub user_id: Option<String>,
    pub organization_id: Option<String>,
    pub cost_center_id: Option<String>,
    /// Target role slug when the caller already knows it
    pub role_slug: Option<String>,
}

/// Evaluate one user operation against the caller's permissions and scope
pub async fn check_user_operation(
    deps: &ServerDeps,
    session: &RequestSession,
    permissions: &PermissionSet,
    operation: UserOperation,
    target: &OperationTarget,
) -> Result<(), AuthError> {
    let scope = ScopeContext::from_session(session)?;

    // Resolve the target's role slug before rules 2/3 when carve-outs apply
    let role_slug = match (&target.role_slug, &target.user_id) {
        (Some(slug), _) => Some(slug.clone()),
        (None, Some(user_id)) if operation.sales_gated() => {
            target_role_slug(deps, user_id).await
        }
        _ => None,
    };
    let target_is_sales = role_slug
        .as_deref()
        .is_some_and(|slug| slug.contains("sales"));

    // Rule 1: coarse "all" grant
    if permissions.has(operation.all_grant()) {
        let all_applies = !operation.sales_gated() || target_is_sales;
        if all_applies {
            return Ok(());
        }
    }

    // Rule 2: organization-scoped grant within the caller's own organization
    if permissions.has(operation.organization_grant())
        && target.organization_id.as_deref() == Some(scope.organization_id.as_str())
    {
        let org_applies = !operation.sales_gated() || !target_is_sales;
        if org_applies {
            return Ok(());
        }
    }

    // Rule 3: cost-center-scoped grant within the caller's own cost center
    if let Some(grant) = operation.cost_center_grant() {
        if permissions.has(grant)
            && scope.cost_center_id.is_some()
            && target.cost_center_id == scope.cost_center_id
        {
            return Ok(());
        }
    }

    Err(AuthError::Denied(DenialReason::OperationNotPermitted))
}
