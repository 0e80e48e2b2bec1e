//! Cost center actions: document-store CRUD behind the guard chain

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::models::{CostCenter, COST_CENTERS_ENTITY, COST_CENTER_FIELDS};
use crate::kernel::{SearchArgs, ServerDeps};

pub async fn create_cost_center(
    deps: &ServerDeps,
    organization_id: &str,
    name: String,
    addresses: Vec<String>,
) -> Result<CostCenter> {
    let cost_center = CostCenter {
        id: Uuid::new_v4().to_string(),
        name,
        organization: organization_id.to_string(),
        addresses,
        created: Utc::now(),
    };

    deps.documents
        .create_document(
            COST_CENTERS_ENTITY,
            serde_json::to_value(&cost_center).context("Failed to serialize cost center")?,
        )
        .await
        .context("Failed to persist cost center")?;

    info!(
        cost_center_id = %cost_center.id,
        organization_id = %organization_id,
        "Cost center created"
    );

    Ok(cost_center)
}

pub async fn get_cost_center(deps: &ServerDeps, id: &str) -> Result<Option<CostCenter>> {
    let doc = deps
        .documents
        .get_document(COST_CENTERS_ENTITY, id, &COST_CENTER_FIELDS)
        .await
        .context("Failed to fetch cost center")?;

    doc.map(CostCenter::from_document).transpose()
}

pub async fn get_cost_centers_by_organization(
    deps: &ServerDeps,
    organization_id: &str,
    page: i32,
    page_size: i32,
) -> Result<Vec<CostCenter>> {
    let rows = deps
        .documents
        .search_documents(
            &SearchArgs::new(COST_CENTERS_ENTITY, &COST_CENTER_FIELDS)
                .with_filter(format!("organization={}", organization_id))
                .with_page(page, page_size),
        )
        .await
        .context("Failed to search cost centers")?;

    rows.into_iter().map(CostCenter::from_document).collect()
}
