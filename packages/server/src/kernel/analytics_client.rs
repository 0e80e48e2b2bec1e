use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use super::{AuthMetric, BaseAnalyticsChannel};

/// Number of retries after the first attempt
const MAX_RETRIES: u32 = 2;
/// Fixed delay between attempts
const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// HTTP client for the platform analytics service
///
/// Retries each metric up to twice with fixed backoff before surfacing the
/// failure. The guard chain treats a surfaced failure as non-fatal.
pub struct AnalyticsClient {
    base_url: String,
    client: reqwest::Client,
}

impl AnalyticsClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { base_url, client })
    }

    async fn post_metric(&self, metric: &AuthMetric) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/api/analytics/metrics", self.base_url))
            .json(metric)
            .send()
            .await
            .context("Failed to send metric")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Analytics service error: {}", status);
        }

        Ok(())
    }
}

/// Drive one send attempt plus up to MAX_RETRIES retries with fixed backoff
async fn send_with_retry<F, Fut>(mut send: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    let mut attempt = 0;
    loop {
        match send().await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < MAX_RETRIES => {
                attempt += 1;
                warn!(error = %e, attempt, "Metric send failed, retrying");
                tokio::time::sleep(RETRY_BACKOFF).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[async_trait]
impl BaseAnalyticsChannel for AnalyticsClient {
    async fn send_metric(&self, metric: &AuthMetric) -> Result<()> {
        send_with_retry(|| self.post_metric(metric)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let attempts = AtomicU32::new(0);

        let result = send_with_retry(|| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    anyhow::bail!("connection reset");
                }
                Ok(())
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failure_surfaces_once_retries_are_exhausted() {
        let attempts = AtomicU32::new(0);

        let result = send_with_retry(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { anyhow::bail!("analytics service error: 503") }
        })
        .await;

        assert!(result.is_err());
        // The first attempt plus every retry
        assert_eq!(attempts.load(Ordering::SeqCst), 1 + MAX_RETRIES);
    }
}
