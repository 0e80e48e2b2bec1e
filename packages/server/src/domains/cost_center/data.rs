//! GraphQL data types for the cost center domain

use super::models::CostCenter;

#[derive(Debug, Clone, juniper::GraphQLObject)]
pub struct CostCenterData {
    pub id: String,
    pub name: String,
    pub organization: String,
    pub addresses: Vec<String>,
    pub created: String,
}

impl From<CostCenter> for CostCenterData {
    fn from(cost_center: CostCenter) -> Self {
        Self {
            id: cost_center.id,
            name: cost_center.name,
            organization: cost_center.organization,
            addresses: cost_center.addresses,
            created: cost_center.created.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, juniper::GraphQLInputObject)]
pub struct CreateCostCenterInput {
    pub name: String,
    pub addresses: Option<Vec<String>>,
}
