use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::{BasePermissionsService, PermissionsUser, RoleInfo};
use crate::common::auth::PermissionSet;

/// GraphQL client for the storefront permissions service
pub struct PermissionsClient {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    variables: Value,
}

const CHECK_USER_PERMISSION: &str = r#"
query CheckUserPermission($sender: String!) {
  checkUserPermission(sender: $sender) {
    role { id slug }
    permissions
  }
}"#;

const GET_ROLE: &str = r#"
query GetRole($id: ID!) {
  getRole(id: $id) { id slug }
}"#;

const GET_B2B_USER: &str = r#"
query GetB2BUser($id: ID!) {
  getB2BUser(id: $id) { id roleId orgId costId }
}"#;

impl PermissionsClient {
    pub fn new(endpoint: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { endpoint, client })
    }

    /// Run one query and return the named field out of `data`
    async fn query(
        &self,
        query: &str,
        variables: Value,
        field: &str,
        store_token: Option<&str>,
    ) -> Result<Value> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&GraphQLRequest { query, variables });

        // The permissions service resolves the caller from the store session
        if let Some(token) = store_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .context("Failed to send permissions query")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Permissions service error: {}", status);
        }

        let mut body: Value = response
            .json()
            .await
            .context("Failed to parse permissions response")?;

        if let Some(errors) = body.get("errors") {
            anyhow::bail!("Permissions query failed: {}", errors);
        }

        Ok(body
            .get_mut("data")
            .and_then(|d| d.get_mut(field))
            .map(Value::take)
            .unwrap_or(Value::Null))
    }
}

fn parse_user(value: Value) -> Result<Option<PermissionsUser>> {
    if value.is_null() {
        return Ok(None);
    }
    let user = PermissionsUser {
        id: value["id"].as_str().unwrap_or_default().to_string(),
        role_id: value["roleId"].as_str().unwrap_or_default().to_string(),
        org_id: value["orgId"].as_str().map(|s| s.to_string()),
        cost_id: value["costId"].as_str().map(|s| s.to_string()),
    };
    Ok(Some(user))
}

#[async_trait]
impl BasePermissionsService for PermissionsClient {
    async fn check_user_permission(
        &self,
        store_token: Option<&str>,
        sender: &str,
    ) -> Result<Option<PermissionSet>> {
        let data = self
            .query(
                CHECK_USER_PERMISSION,
                serde_json::json!({ "sender": sender }),
                "checkUserPermission",
                store_token,
            )
            .await?;

        if data.is_null() {
            return Ok(None);
        }

        let set: PermissionSet =
            serde_json::from_value(data).context("Failed to parse permission set")?;
        Ok(Some(set))
    }

    async fn get_role(&self, id: &str) -> Result<Option<RoleInfo>> {
        let data = self
            .query(GET_ROLE, serde_json::json!({ "id": id }), "getRole", None)
            .await?;

        if data.is_null() {
            return Ok(None);
        }

        Ok(Some(RoleInfo {
            id: data["id"].as_str().unwrap_or_default().to_string(),
            slug: data["slug"].as_str().unwrap_or_default().to_string(),
        }))
    }

    async fn get_b2b_user(&self, id: &str) -> Result<Option<PermissionsUser>> {
        let data = self
            .query(
                GET_B2B_USER,
                serde_json::json!({ "id": id }),
                "getB2BUser",
                None,
            )
            .await?;
        parse_user(data)
    }
}
