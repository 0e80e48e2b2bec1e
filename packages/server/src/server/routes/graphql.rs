//! GraphQL endpoints.
//!
//! The per-request session is built here rather than in middleware because
//! the sender override rides inside the GraphQL request body
//! (`extensions.persistedQuery.sender`), which only exists after the body is
//! parsed.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use juniper::http::{GraphQLBatchRequest, GraphQLRequest};

use crate::common::auth::RequestSession;
use crate::server::app::AxumAppState;
use crate::server::graphql::{GraphQLContext, Schema};
use crate::server::middleware::ClientIp;

/// Sender named in the persisted-query extensions, if any. Batch requests
/// carry one sender for the whole batch, read off the first entry.
fn sender_from_extensions(body: &serde_json::Value) -> Option<String> {
    let request = body.as_array().and_then(|batch| batch.first()).unwrap_or(body);

    request
        .get("extensions")?
        .get("persistedQuery")?
        .get("sender")
        .and_then(|sender| sender.as_str())
        .map(str::to_string)
}

fn build_session(
    headers: &HeaderMap,
    client_ip: Option<IpAddr>,
    sender_app: Option<String>,
) -> RequestSession {
    // Header names come out of axum already lowercased
    let header_map: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    RequestSession::from_headers(header_map, client_ip, sender_app)
}

/// GraphQL POST endpoint
pub async fn graphql_handler(
    State(schema): State<Arc<Schema>>,
    Extension(state): Extension<AxumAppState>,
    client_ip: Option<Extension<ClientIp>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let sender_app = sender_from_extensions(&body);
    let session = Arc::new(build_session(
        &headers,
        client_ip.map(|Extension(ip)| ip.0),
        sender_app,
    ));
    let context = GraphQLContext::new(state.deps.clone(), session);

    let request: GraphQLRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": format!("Invalid GraphQL request: {}", e) })),
            )
                .into_response()
        }
    };

    let response = request.execute(&schema, &context).await;
    let status = if response.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    (status, Json(response)).into_response()
}

/// GraphQL batch POST endpoint
pub async fn graphql_batch_handler(
    State(schema): State<Arc<Schema>>,
    Extension(state): Extension<AxumAppState>,
    client_ip: Option<Extension<ClientIp>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let sender_app = sender_from_extensions(&body);
    let session = Arc::new(build_session(
        &headers,
        client_ip.map(|Extension(ip)| ip.0),
        sender_app,
    ));
    let context = GraphQLContext::new(state.deps.clone(), session);

    let batch: GraphQLBatchRequest = match serde_json::from_value(body) {
        Ok(batch) => batch,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": format!("Invalid GraphQL request: {}", e) })),
            )
                .into_response()
        }
    };

    let response = batch.execute(&schema, &context).await;
    let status = if response.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    (status, Json(response)).into_response()
}

/// GraphQL playground (GraphiQL)
pub async fn graphql_playground() -> Html<String> {
    Html(
        r#"
<!DOCTYPE html>
<html>
<head>
    <title>GraphQL Playground</title>
    <style>
        body {
            height: 100%;
            margin: 0;
            width: 100%;
            overflow: hidden;
        }
        #graphiql {
            height: 100vh;
        }
    </style>
    <script
        crossorigin
        src="https://unpkg.com/react@18/umd/react.production.min.js"
    ></script>
    <script
        crossorigin
        src="https://unpkg.com/react-dom@18/umd/react-dom.production.min.js"
    ></script>
    <link rel="stylesheet" href="https://unpkg.com/graphiql/graphiql.min.css" />
</head>
<body>
    <div id="graphiql">Loading...</div>
    <script
        src="https://unpkg.com/graphiql/graphiql.min.js"
        type="application/javascript"
    ></script>
    <script>
        const fetcher = GraphiQL.createFetcher({
            url: '/graphql',
        });

        ReactDOM.render(
            React.createElement(GraphiQL, { fetcher: fetcher }),
            document.getElementById('graphiql'),
        );
    </script>
</body>
</html>
"#
        .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_is_read_from_persisted_query_extensions() {
        let body = serde_json::json!({
            "query": "{ organizations { id } }",
            "extensions": { "persistedQuery": { "sender": "buyer-portal" } },
        });

        assert_eq!(sender_from_extensions(&body).as_deref(), Some("buyer-portal"));
    }

    #[test]
    fn batch_sender_comes_from_the_first_entry() {
        let body = serde_json::json!([
            {
                "query": "{ organizations { id } }",
                "extensions": { "persistedQuery": { "sender": "buyer-portal" } },
            },
            { "query": "{ costCenterById(id: \"cc-1\") { id } }" },
        ]);

        assert_eq!(sender_from_extensions(&body).as_deref(), Some("buyer-portal"));
    }

    #[test]
    fn missing_extensions_yield_no_sender() {
        let body = serde_json::json!({ "query": "{ organizations { id } }" });

        assert_eq!(sender_from_extensions(&body), None);
    }
}
