//! Organization actions: thin document-store CRUD behind the guard chain.
//!
//! Authorization happens in the resolvers; actions assume an already-allowed
//! caller and only move data.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::models::{
    Organization, OrganizationRequest, ORGANIZATIONS_ENTITY, ORGANIZATION_FIELDS,
    ORGANIZATION_REQUESTS_ENTITY, ORGANIZATION_REQUEST_FIELDS,
};
use crate::common::auth::B2B_USERS_ENTITY;
use crate::domains::cost_center::models::COST_CENTERS_ENTITY;
use crate::kernel::{SearchArgs, ServerDeps};

/// Mail template sent to the new organization's admin
const ORGANIZATION_CREATED_TEMPLATE: &str = "organization-created";

pub async fn create_organization(
    deps: &ServerDeps,
    name: String,
    admin_email: Option<String>,
    default_cost_center_name: Option<String>,
) -> Result<Organization> {
    let organization = Organization {
        id: Uuid::new_v4().to_string(),
        name: name.clone(),
        status: "active".to_string(),
        collections: vec![],
        created: Utc::now(),
    };

    deps.documents
        .create_document(
            ORGANIZATIONS_ENTITY,
            serde_json::to_value(&organization).context("Failed to serialize organization")?,
        )
        .await
        .context("Failed to persist organization")?;

    // Every organization starts with one default cost center
    let cost_center = serde_json::json!({
        "id": Uuid::new_v4().to_string(),
        "name": default_cost_center_name.unwrap_or_else(|| name.clone()),
        "organization": organization.id,
        "addresses": [],
        "created": Utc::now(),
    });
    deps.documents
        .create_document(COST_CENTERS_ENTITY, cost_center)
        .await
        .context("Failed to persist default cost center")?;

    info!(organization_id = %organization.id, name = %name, "Organization created");

    // Notification is best-effort; a mail outage never fails the mutation
    if let Some(email) = admin_email {
        let data = serde_json::json!({
            "organizationId": organization.id,
            "organizationName": organization.name,
        });
        if let Err(e) = deps
            .mail
            .send_template(ORGANIZATION_CREATED_TEMPLATE, &email, data)
            .await
        {
            warn!(error = %e, email = %email, "Failed to send organization-created mail");
        }
    }

    Ok(organization)
}

pub async fn get_organization(deps: &ServerDeps, id: &str) -> Result<Option<Organization>> {
    let doc = deps
        .documents
        .get_document(ORGANIZATIONS_ENTITY, id, &ORGANIZATION_FIELDS)
        .await
        .context("Failed to fetch organization")?;

    doc.map(Organization::from_document).transpose()
}

pub async fn get_organizations(
    deps: &ServerDeps,
    search: Option<String>,
    page: i32,
    page_size: i32,
) -> Result<Vec<Organization>> {
    let mut args = SearchArgs::new(ORGANIZATIONS_ENTITY, &ORGANIZATION_FIELDS)
        .with_page(page, page_size);
    if let Some(search) = search.filter(|s| !s.is_empty()) {
        args = args.with_filter(format!("name={}", search));
    }

    let rows = deps
        .documents
        .search_documents(&args)
        .await
        .context("Failed to search organizations")?;

    rows.into_iter().map(Organization::from_document).collect()
}

pub async fn update_organization(
    deps: &ServerDeps,
    id: &str,
    name: Option<String>,
    status: Option<String>,
) -> Result<Organization> {
    let mut organization = get_organization(deps, id)
        .await?
        .with_context(|| format!("Organization {} not found", id))?;

    if let Some(name) = name {
        organization.name = name;
    }
    if let Some(status) = status {
        organization.status = status;
    }

    deps.documents
        .update_document(
            ORGANIZATIONS_ENTITY,
            id,
            serde_json::to_value(&organization).context("Failed to serialize organization")?,
        )
        .await
        .context("Failed to update organization")?;

    info!(organization_id = %id, "Organization updated");

    Ok(organization)
}

/// Active organizations the given email belongs to, resolved through the
/// caller's B2B user memberships
pub async fn get_active_organizations_by_email(
    deps: &ServerDeps,
    email: &str,
) -> Result<Vec<Organization>> {
    let memberships = deps
        .documents
        .search_documents(
            &SearchArgs::new(B2B_USERS_ENTITY, &["id", "orgId"])
                .with_filter(format!("email={}", email))
                .with_page(1, 50),
        )
        .await
        .context("Failed to search user memberships")?;

    let mut organizations = Vec::new();
    for membership in memberships {
        let Some(org_id) = membership["orgId"].as_str() else {
            continue;
        };
        if let Some(org) = get_organization(deps, org_id).await? {
            if org.status == "active" {
                organizations.push(org);
            }
        }
    }

    Ok(organizations)
}

pub async fn create_organization_request(
    deps: &ServerDeps,
    name: String,
    b2b_customer_admin_email: String,
    notes: Option<String>,
) -> Result<OrganizationRequest> {
    let request = OrganizationRequest {
        id: Uuid::new_v4().to_string(),
        name,
        b2b_customer_admin_email,
        status: "pending".to_string(),
        notes,
        created: Utc::now(),
    };

    deps.documents
        .create_document(
            ORGANIZATION_REQUESTS_ENTITY,
            serde_json::to_value(&request).context("Failed to serialize organization request")?,
        )
        .await
        .context("Failed to persist organization request")?;

    info!(request_id = %request.id, "Organization request created");

    Ok(request)
}

pub async fn get_organization_request(
    deps: &ServerDeps,
    id: &str,
) -> Result<Option<OrganizationRequest>> {
    let doc = deps
        .documents
        .get_document(ORGANIZATION_REQUESTS_ENTITY, id, &ORGANIZATION_REQUEST_FIELDS)
        .await
        .context("Failed to fetch organization request")?;

    doc.map(OrganizationRequest::from_document).transpose()
}

pub async fn update_organization_request_status(
    deps: &ServerDeps,
    id: &str,
    status: String,
    notes: Option<String>,
) -> Result<OrganizationRequest> {
    let mut request = get_organization_request(deps, id)
        .await?
        .with_context(|| format!("Organization request {} not found", id))?;

    request.status = status;
    if notes.is_some() {
        request.notes = notes;
    }

    deps.documents
        .update_document(
            ORGANIZATION_REQUESTS_ENTITY,
            id,
            serde_json::to_value(&request).context("Failed to serialize organization request")?,
        )
        .await
        .context("Failed to update organization request")?;

    info!(request_id = %id, status = %request.status, "Organization request updated");

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{MockMailService, TestDeps};

    #[tokio::test]
    async fn create_organization_persists_default_cost_center() {
        let deps = TestDeps::new();
        let server_deps = deps.build();

        let org = create_organization(
            &server_deps,
            "Acme Corp".to_string(),
            Some("admin@acme.com".to_string()),
            None,
        )
        .await
        .unwrap();

        assert_eq!(org.status, "active");

        let created = deps.documents.created_documents();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].0, ORGANIZATIONS_ENTITY);
        assert_eq!(created[1].0, COST_CENTERS_ENTITY);
        // Default cost center inherits the organization name
        assert_eq!(created[1].1["name"], "Acme Corp");
        assert_eq!(created[1].1["organization"], org.id);

        let mail = deps.mail.sent_mail();
        assert_eq!(
            mail,
            vec![(
                ORGANIZATION_CREATED_TEMPLATE.to_string(),
                "admin@acme.com".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn mail_outage_does_not_fail_creation() {
        let deps = TestDeps::new().with_mail(MockMailService::new().failing());
        let server_deps = deps.build();

        let result = create_organization(
            &server_deps,
            "Acme Corp".to_string(),
            Some("admin@acme.com".to_string()),
            None,
        )
        .await;

        assert!(result.is_ok());
    }
}
