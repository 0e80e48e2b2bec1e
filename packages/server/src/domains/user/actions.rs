//! B2B user actions. Scope checks happen in the resolvers through the scope
//! matcher; these only move membership records.

use anyhow::{Context, Result};
use tracing::info;
use uuid::Uuid;

use super::models::{B2BUser, B2B_USER_FIELDS};
use crate::common::auth::B2B_USERS_ENTITY;
use crate::kernel::ServerDeps;

pub async fn get_b2b_user(deps: &ServerDeps, id: &str) -> Result<Option<B2BUser>> {
    let doc = deps
        .documents
        .get_document(B2B_USERS_ENTITY, id, &B2B_USER_FIELDS)
        .await
        .context("Failed to fetch B2B user")?;

    doc.map(B2BUser::from_document).transpose()
}

pub async fn add_user(
    deps: &ServerDeps,
    email: String,
    org_id: String,
    cost_id: Option<String>,
    role_id: String,
) -> Result<B2BUser> {
    let user = B2BUser {
        id: Uuid::new_v4().to_string(),
        email,
        org_id,
        cost_id,
        role_id,
    };

    deps.documents
        .create_document(
            B2B_USERS_ENTITY,
            serde_json::to_value(&user).context("Failed to serialize B2B user")?,
        )
        .await
        .context("Failed to persist B2B user")?;

    info!(user_id = %user.id, org_id = %user.org_id, "B2B user added");

    Ok(user)
}

pub async fn remove_user(deps: &ServerDeps, user_id: &str) -> Result<()> {
    deps.documents
        .delete_document(B2B_USERS_ENTITY, user_id)
        .await
        .context("Failed to remove B2B user")?;

    info!(user_id = %user_id, "B2B user removed");

    Ok(())
}
