//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    extract::Extension,
    http::Method,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::kernel::{
    AnalyticsClient, AuditClient, DocumentStoreClient, IdentityClient, MailClient,
    PermissionsClient, ServerDeps,
};
use crate::server::graphql::create_schema;
use crate::server::middleware::extract_client_ip;
use crate::server::routes::{
    graphql_batch_handler, graphql_handler, graphql_playground, health_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub deps: ServerDeps,
}

/// Wire the platform clients into ServerDeps
pub fn build_deps(config: &Config) -> Result<ServerDeps> {
    Ok(ServerDeps::new(
        Arc::new(IdentityClient::new(config.identity_url.clone())?),
        Arc::new(PermissionsClient::new(config.permissions_url.clone())?),
        Arc::new(DocumentStoreClient::new(config.document_store_url.clone())?),
        Arc::new(AnalyticsClient::new(config.analytics_url.clone())?),
        Arc::new(AuditClient::new(config.audit_url.clone())?),
        Arc::new(MailClient::new(config.mail_url.clone())?),
        config.account.clone(),
        config.app_id.clone(),
    ))
}

/// Build the Axum application router
pub fn build_app(config: &Config) -> Result<Router> {
    // GraphQL schema (singleton)
    let schema = Arc::new(create_schema());

    let deps = build_deps(config)?;
    let app_state = AxumAppState { deps };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/graphql", post(graphql_handler))
        .route("/graphql/batch", post(graphql_batch_handler));

    // GraphQL playground only in debug builds (development)
    #[cfg(debug_assertions)]
    {
        router = router.route("/graphql", get(graphql_playground));
    }

    let app = router
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(extract_client_ip))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .with_state(schema);

    Ok(app)
}
