//! GraphQL schema definition.
//!
//! Every resolver runs its guard before touching data; the guard emits the
//! auth metric for the decision and raises on deny. Storefront callers
//! (store-token path) additionally go through organization scoping or the
//! user-operation scope matcher.

use juniper::{EmptySubscription, FieldError, FieldResult, RootNode};
use tracing::error;

use super::context::GraphQLContext;

use crate::common::auth::{
    AuthError, CredentialStrategy, DenialReason, LicensePermission, OperationTarget,
    UserOperation,
};

// Domain actions
use crate::domains::cost_center::actions as cost_center_actions;
use crate::domains::organization::actions as organization_actions;
use crate::domains::user::actions as user_actions;

// Domain data types (GraphQL types)
use crate::domains::cost_center::data::{CostCenterData, CreateCostCenterInput};
use crate::domains::organization::data::{
    CreateOrganizationInput, CreateOrganizationRequestInput, OrganizationData,
    OrganizationRequestData, UpdateOrganizationInput,
};
use crate::domains::user::data::{AddUserInput, B2BUserData, ImpersonationData, RemoveUserInput};

const DEFAULT_PAGE: i32 = 1;
const DEFAULT_PAGE_SIZE: i32 = 25;

/// Convert a data-layer failure into a generic field error, keeping the
/// detail in the logs
fn data_error(e: anyhow::Error, what: &'static str) -> FieldError {
    error!(error = %e, "{}", what);
    FieldError::new(what, juniper::Value::null())
}

pub struct Query;

#[juniper::graphql_object(context = GraphQLContext)]
impl Query {
    /// List organizations; admin-class credential required
    async fn organizations(
        ctx: &GraphQLContext,
        search: Option<String>,
        page: Option<i32>,
        page_size: Option<i32>,
    ) -> FieldResult<Vec<OrganizationData>> {
        ctx.check_admin_access("getOrganizations").await?;

        let organizations = organization_actions::get_organizations(
            ctx.deps(),
            search,
            page.unwrap_or(DEFAULT_PAGE),
            page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await
        .map_err(|e| data_error(e, "Failed to list organizations"))?;

        Ok(organizations.into_iter().map(Into::into).collect())
    }

    /// Fetch one organization; requires the buyer-organization view license
    async fn organization_by_id(
        ctx: &GraphQLContext,
        id: String,
    ) -> FieldResult<Option<OrganizationData>> {
        ctx.validate_admin_user_access("getOrganizationById", LicensePermission::View)
            .await?;

        let organization = organization_actions::get_organization(ctx.deps(), &id)
            .await
            .map_err(|e| data_error(e, "Failed to fetch organization"))?;

        Ok(organization.map(Into::into))
    }

    /// Cost centers of one organization. Storefront callers see only their
    /// own organization unless they hold a sales-admin role.
    async fn cost_centers_by_organization(
        ctx: &GraphQLContext,
        organization_id: String,
        page: Option<i32>,
        page_size: Option<i32>,
    ) -> FieldResult<Vec<CostCenterData>> {
        let path = ctx.check_user_access("getCostCenters").await?;
        ctx.require_organization_scope(path, &organization_id)
            .await?;

        let cost_centers = cost_center_actions::get_cost_centers_by_organization(
            ctx.deps(),
            &organization_id,
            page.unwrap_or(DEFAULT_PAGE),
            page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await
        .map_err(|e| data_error(e, "Failed to list cost centers"))?;

        Ok(cost_centers.into_iter().map(Into::into).collect())
    }

    async fn cost_center_by_id(
        ctx: &GraphQLContext,
        id: String,
    ) -> FieldResult<Option<CostCenterData>> {
        let path = ctx.check_user_access("getCostCenterById").await?;

        let cost_center = cost_center_actions::get_cost_center(ctx.deps(), &id)
            .await
            .map_err(|e| data_error(e, "Failed to fetch cost center"))?;

        if let Some(cost_center) = &cost_center {
            ctx.require_organization_scope(path, &cost_center.organization)
                .await?;
        }

        Ok(cost_center.map(Into::into))
    }

    /// Active organizations an email belongs to. Storefront callers may only
    /// look up their own email unless they hold a sales-admin role.
    async fn active_organizations_by_email(
        ctx: &GraphQLContext,
        email: String,
    ) -> FieldResult<Vec<OrganizationData>> {
        let path = ctx
            .check_user_access("getActiveOrganizationsByEmail")
            .await?;

        if path == CredentialStrategy::StoreToken {
            let own_email = ctx.session().namespaces().email.clone();
            if own_email.as_deref() != Some(email.as_str()) && !ctx.caller_is_sales_admin().await
            {
                return Err(AuthError::Denied(DenialReason::OperationNotPermitted).into());
            }
        }

        let organizations =
            organization_actions::get_active_organizations_by_email(ctx.deps(), &email)
                .await
                .map_err(|e| data_error(e, "Failed to resolve organizations by email"))?;

        Ok(organizations.into_iter().map(Into::into).collect())
    }

    async fn b2b_user(ctx: &GraphQLContext, id: String) -> FieldResult<Option<B2BUserData>> {
        let path = ctx.validate_store_user_access("getB2BUser").await?;

        let user = user_actions::get_b2b_user(ctx.deps(), &id)
            .await
            .map_err(|e| data_error(e, "Failed to fetch B2B user"))?;

        if let Some(user) = &user {
            ctx.require_organization_scope(path, &user.org_id).await?;
        }

        Ok(user.map(Into::into))
    }

    async fn organization_request_by_id(
        ctx: &GraphQLContext,
        id: String,
    ) -> FieldResult<Option<OrganizationRequestData>> {
        ctx.check_admin_access("getOrganizationRequestById").await?;

        let request = organization_actions::get_organization_request(ctx.deps(), &id)
            .await
            .map_err(|e| data_error(e, "Failed to fetch organization request"))?;

        Ok(request.map(Into::into))
    }
}

pub struct Mutation;

#[juniper::graphql_object(context = GraphQLContext)]
impl Mutation {
    async fn create_organization(
        ctx: &GraphQLContext,
        input: CreateOrganizationInput,
    ) -> FieldResult<OrganizationData> {
        ctx.check_admin_access("createOrganization").await?;

        let organization = organization_actions::create_organization(
            ctx.deps(),
            input.name,
            input.admin_email,
            input.default_cost_center_name,
        )
        .await
        .map_err(|e| data_error(e, "Failed to create organization"))?;

        Ok(organization.into())
    }

    /// Requires the buyer-organization edit license
    async fn update_organization(
        ctx: &GraphQLContext,
        id: String,
        input: UpdateOrganizationInput,
    ) -> FieldResult<OrganizationData> {
        ctx.validate_admin_user_access("updateOrganization", LicensePermission::Edit)
            .await?;

        let organization =
            organization_actions::update_organization(ctx.deps(), &id, input.name, input.status)
                .await
                .map_err(|e| data_error(e, "Failed to update organization"))?;

        Ok(organization.into())
    }

    /// Storefront callers may only create cost centers inside their own
    /// organization
    async fn create_cost_center(
        ctx: &GraphQLContext,
        organization_id: String,
        input: CreateCostCenterInput,
    ) -> FieldResult<CostCenterData> {
        let path = ctx.validate_store_user_access("createCostCenter").await?;
        ctx.require_organization_scope(path, &organization_id)
            .await?;

        let cost_center = cost_center_actions::create_cost_center(
            ctx.deps(),
            &organization_id,
            input.name,
            input.addresses.unwrap_or_default(),
        )
        .await
        .map_err(|e| data_error(e, "Failed to create cost center"))?;

        Ok(cost_center.into())
    }

    async fn add_user(ctx: &GraphQLContext, input: AddUserInput) -> FieldResult<B2BUserData> {
        let path = ctx.validate_store_user_access("addUser").await?;

        // Role carve-outs need the new member's slug; resolution failures
        // fold to None and the scope matcher treats the target as non-sales
        let role_slug = ctx
            .deps()
            .permissions
            .get_role(&input.role_id)
            .await
            .ok()
            .flatten()
            .map(|role| role.slug);
        let target = OperationTarget {
            user_id: None,
            organization_id: Some(input.org_id.clone()),
            cost_center_id: input.cost_id.clone(),
            role_slug,
        };
        ctx.require_user_operation(path, UserOperation::AddUser, &target)
            .await?;

        let user = user_actions::add_user(
            ctx.deps(),
            input.email,
            input.org_id,
            input.cost_id,
            input.role_id,
        )
        .await
        .map_err(|e| data_error(e, "Failed to add B2B user"))?;

        Ok(user.into())
    }

    async fn remove_user(ctx: &GraphQLContext, input: RemoveUserInput) -> FieldResult<bool> {
        let path = ctx.validate_store_user_access("removeUser").await?;

        let user = user_actions::get_b2b_user(ctx.deps(), &input.user_id)
            .await
            .map_err(|e| data_error(e, "Failed to fetch B2B user"))?
            .ok_or_else(|| FieldError::new("B2B user not found", juniper::Value::null()))?;

        let target = OperationTarget {
            user_id: Some(user.id.clone()),
            organization_id: Some(user.org_id.clone()),
            cost_center_id: user.cost_id.clone(),
            role_slug: None,
        };
        ctx.require_user_operation(path, UserOperation::RemoveUser, &target)
            .await?;

        user_actions::remove_user(ctx.deps(), &user.id)
            .await
            .map_err(|e| data_error(e, "Failed to remove B2B user"))?;

        Ok(true)
    }

    async fn impersonate_user(
        ctx: &GraphQLContext,
        user_id: String,
    ) -> FieldResult<ImpersonationData> {
        let path = ctx.validate_store_user_access("impersonateUser").await?;

        let user = user_actions::get_b2b_user(ctx.deps(), &user_id)
            .await
            .map_err(|e| data_error(e, "Failed to fetch B2B user"))?
            .ok_or_else(|| FieldError::new("B2B user not found", juniper::Value::null()))?;

        let target = OperationTarget {
            user_id: Some(user.id.clone()),
            organization_id: Some(user.org_id.clone()),
            cost_center_id: user.cost_id.clone(),
            role_slug: None,
        };
        ctx.require_user_operation(path, UserOperation::ImpersonateUser, &target)
            .await?;

        Ok(ImpersonationData {
            user_id: user.id,
            email: user.email,
            org_id: user.org_id,
            cost_id: user.cost_id,
        })
    }

    /// Open to any recognized caller; new organizations go through review
    async fn create_organization_request(
        ctx: &GraphQLContext,
        input: CreateOrganizationRequestInput,
    ) -> FieldResult<OrganizationRequestData> {
        ctx.check_user_access("createOrganizationRequest").await?;

        let request = organization_actions::create_organization_request(
            ctx.deps(),
            input.name,
            input.b2b_customer_admin_email,
            input.notes,
        )
        .await
        .map_err(|e| data_error(e, "Failed to create organization request"))?;

        Ok(request.into())
    }

    async fn update_organization_request_status(
        ctx: &GraphQLContext,
        id: String,
        status: String,
        notes: Option<String>,
    ) -> FieldResult<OrganizationRequestData> {
        ctx.check_admin_access("updateOrganizationRequestStatus")
            .await?;

        let request = organization_actions::update_organization_request_status(
            ctx.deps(),
            &id,
            status,
            notes,
        )
        .await
        .map_err(|e| data_error(e, "Failed to update organization request"))?;

        Ok(request.into())
    }
}

pub type Schema = RootNode<'static, Query, Mutation, EmptySubscription<GraphQLContext>>;

pub fn create_schema() -> Schema {
    Schema::new(Query, Mutation, EmptySubscription::new())
}
