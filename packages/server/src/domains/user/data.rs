//! GraphQL data types for the B2B user domain

use super::models::B2BUser;

#[derive(Debug, Clone, juniper::GraphQLObject)]
pub struct B2BUserData {
    pub id: String,
    pub email: String,
    pub org_id: String,
    pub cost_id: Option<String>,
    pub role_id: String,
}

impl From<B2BUser> for B2BUserData {
    fn from(user: B2BUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            org_id: user.org_id,
            cost_id: user.cost_id,
            role_id: user.role_id,
        }
    }
}

#[derive(Debug, Clone, juniper::GraphQLInputObject)]
pub struct AddUserInput {
    pub email: String,
    pub org_id: String,
    pub cost_id: Option<String>,
    pub role_id: String,
}

#[derive(Debug, Clone, juniper::GraphQLInputObject)]
pub struct RemoveUserInput {
    pub user_id: String,
}

/// Result of assuming a storefront user's identity
#[derive(Debug, Clone, juniper::GraphQLObject)]
pub struct ImpersonationData {
    pub user_id: String,
    pub email: String,
    pub org_id: String,
    pub cost_id: Option<String>,
}
