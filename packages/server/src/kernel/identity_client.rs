use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{AuthenticatedUser, BaseIdentityAuthority, TokenClaims};

/// HTTP client for the platform identity authority
pub struct IdentityClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ValidateTokenRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Serialize)]
struct GetTokenRequest<'a> {
    app_key: &'a str,
    app_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct GetTokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct LicenseCheckResponse {
    has_permission: bool,
}

impl IdentityClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { base_url, client })
    }
}

#[async_trait]
impl BaseIdentityAuthority for IdentityClient {
    async fn validate_token(&self, token: &str) -> Result<TokenClaims> {
        let response = self
            .client
            .post(format!("{}/api/identity/token/validate", self.base_url))
            .json(&ValidateTokenRequest { token })
            .send()
            .await
            .context("Failed to send token validation request")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Identity authority rejected token: {}", status);
        }

        response
            .json::<TokenClaims>()
            .await
            .context("Failed to parse token claims")
    }

    async fn get_token(&self, app_key: &str, app_token: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/api/identity/token", self.base_url))
            .json(&GetTokenRequest { app_key, app_token })
            .send()
            .await
            .context("Failed to send token exchange request")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Token exchange failed: {}", status);
        }

        let body: GetTokenResponse = response
            .json()
            .await
            .context("Failed to parse token exchange response")?;

        Ok(body.token)
    }

    async fn get_authenticated_user(
        &self,
        store_token: &str,
    ) -> Result<Option<AuthenticatedUser>> {
        let response = self
            .client
            .get(format!("{}/api/identity/user", self.base_url))
            .bearer_auth(store_token)
            .send()
            .await
            .context("Failed to send authenticated-user request")?;

        // Unknown or expired store sessions come back as 401/404, not errors
        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            || response.status() == reqwest::StatusCode::NOT_FOUND
        {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Authenticated-user lookup failed: {}", status);
        }

        let user: AuthenticatedUser = response
            .json()
            .await
            .context("Failed to parse authenticated user")?;

        Ok(Some(user))
    }

    async fn check_license_permission(&self, token: &str, resource: &str) -> Result<bool> {
        let response = self
            .client
            .get(format!(
                "{}/api/license-manager/resources/{}/check",
                self.base_url, resource
            ))
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send license permission check")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("License permission check failed: {}", status);
        }

        let body: LicenseCheckResponse = response
            .json()
            .await
            .context("Failed to parse license permission response")?;

        Ok(body.has_permission)
    }
}
