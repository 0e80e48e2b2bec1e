use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::warn;

use super::{AuditEvent, BaseAuditChannel};

/// HTTP client for the platform audit channel
///
/// Best-effort by contract: failures are logged here and never reach callers.
pub struct AuditClient {
    base_url: String,
    client: reqwest::Client,
}

impl AuditClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { base_url, client })
    }

    async fn post_event(&self, event: &AuditEvent) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/api/audit/events", self.base_url))
            .json(event)
            .send()
            .await
            .context("Failed to send audit event")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Audit service error: {}", status);
        }

        Ok(())
    }
}

#[async_trait]
impl BaseAuditChannel for AuditClient {
    async fn send_event(&self, event: AuditEvent) {
        if let Err(e) = self.post_event(&event).await {
            warn!(
                error = %e,
                subject_id = %event.subject_id,
                "Failed to emit audit event"
            );
        }
    }
}
