//! GraphQL data types for the organization domain

use super::models::{Organization, OrganizationRequest};

#[derive(Debug, Clone, juniper::GraphQLObject)]
pub struct OrganizationData {
    pub id: String,
    pub name: String,
    pub status: String,
    pub collections: Vec<String>,
    pub created: String,
}

impl From<Organization> for OrganizationData {
    fn from(org: Organization) -> Self {
        Self {
            id: org.id,
            name: org.name,
            status: org.status,
            collections: org.collections,
            created: org.created.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, juniper::GraphQLObject)]
pub struct OrganizationRequestData {
    pub id: String,
    pub name: String,
    pub b2b_customer_admin_email: String,
    pub status: String,
    pub notes: Option<String>,
    pub created: String,
}

impl From<OrganizationRequest> for OrganizationRequestData {
    fn from(request: OrganizationRequest) -> Self {
        Self {
            id: request.id,
            name: request.name,
            b2b_customer_admin_email: request.b2b_customer_admin_email,
            status: request.status,
            notes: request.notes,
            created: request.created.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, juniper::GraphQLInputObject)]
pub struct CreateOrganizationInput {
    pub name: String,
    /// Admin of the new organization; receives the welcome notification
    pub admin_email: Option<String>,
    /// Name for the default cost center, defaults to the organization name
    pub default_cost_center_name: Option<String>,
}

#[derive(Debug, Clone, juniper::GraphQLInputObject)]
pub struct UpdateOrganizationInput {
    pub name: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, juniper::GraphQLInputObject)]
pub struct CreateOrganizationRequestInput {
    pub name: String,
    pub b2b_customer_admin_email: String,
    pub notes: Option<String>,
}
