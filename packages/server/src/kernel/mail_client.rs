use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::BaseMailService;

/// HTTP client for the platform transactional mail service
pub struct MailClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SendTemplateRequest<'a> {
    template: &'a str,
    to: &'a str,
    data: Value,
}

impl MailClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { base_url, client })
    }
}

#[async_trait]
impl BaseMailService for MailClient {
    async fn send_template(&self, template: &str, to: &str, data: Value) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/api/mail/send", self.base_url))
            .json(&SendTemplateRequest { template, to, data })
            .send()
            .await
            .context("Failed to send mail request")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Mail service error: {}", status);
        }

        Ok(())
    }
}
