use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{BaseDocumentStore, SearchArgs};

/// HTTP client for the platform document store
///
/// Entities are schemaless JSON documents addressed by entity name + id.
pub struct DocumentStoreClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CreateDocumentResponse {
    #[serde(rename = "documentId")]
    document_id: String,
}

impl DocumentStoreClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { base_url, client })
    }

    fn entity_url(&self, entity: &str) -> String {
        format!("{}/api/documents/{}", self.base_url, entity)
    }
}

#[async_trait]
impl BaseDocumentStore for DocumentStoreClient {
    async fn create_document(&self, entity: &str, body: Value) -> Result<String> {
        let response = self
            .client
            .post(self.entity_url(entity))
            .json(&body)
            .send()
            .await
            .context("Failed to send create-document request")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Document create failed ({}): {}", status, text);
        }

        let created: CreateDocumentResponse = response
            .json()
            .await
            .context("Failed to parse create-document response")?;

        Ok(created.document_id)
    }

    async fn get_document(
        &self,
        entity: &str,
        id: &str,
        fields: &[&str],
    ) -> Result<Option<Value>> {
        let response = self
            .client
            .get(format!("{}/{}", self.entity_url(entity), id))
            .query(&[("fields", fields.join(","))])
            .send()
            .await
            .context("Failed to send get-document request")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Document get failed: {}", status);
        }

        let doc: Value = response
            .json()
            .await
            .context("Failed to parse document")?;

        Ok(Some(doc))
    }

    async fn update_document(&self, entity: &str, id: &str, body: Value) -> Result<()> {
        let response = self
            .client
            .patch(format!("{}/{}", self.entity_url(entity), id))
            .json(&body)
            .send()
            .await
            .context("Failed to send update-document request")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Document update failed: {}", status);
        }

        Ok(())
    }

    async fn delete_document(&self, entity: &str, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/{}", self.entity_url(entity), id))
            .send()
            .await
            .context("Failed to send delete-document request")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Document delete failed: {}", status);
        }

        Ok(())
    }

    async fn search_documents(&self, args: &SearchArgs) -> Result<Vec<Value>> {
        let mut query: Vec<(&str, String)> = vec![
            ("fields", args.fields.join(",")),
            ("page", args.page.to_string()),
            ("pageSize", args.page_size.to_string()),
        ];
        if let Some(filter) = &args.filter {
            query.push(("where", filter.clone()));
        }

        let response = self
            .client
            .get(format!("{}/search", self.entity_url(&args.entity)))
            .query(&query)
            .send()
            .await
            .context("Failed to send document search request")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Document search failed: {}", status);
        }

        let rows: Vec<Value> = response
            .json()
            .await
            .context("Failed to parse document search rows")?;

        Ok(rows)
    }
}
