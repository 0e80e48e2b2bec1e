//! Audit/metrics sink for authorization decisions.
//!
//! Every guard decision produces exactly one metric; denied decisions (401 or
//! 403) additionally produce a structured audit event. Neither channel may
//! affect the already-computed decision: failures are logged and swallowed.

use tracing::warn;

use super::session::RequestSession;
use crate::kernel::{AuditEvent, AuditMeta, AuthMetric, ServerDeps};

/// Metric kind shared by all guard emissions
pub const AUTH_METRIC_KIND: &str = "b2b-authorization";

/// Verb prefixes stripped from operation names before deriving audit names
const VERB_PREFIXES: [&str; 5] = ["get", "post", "create", "update", "list"];

/// Deterministic audit naming for one denied operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditNames {
    /// kebab-case + event suffix, e.g. `remove-user-forbidden-error-event`
    pub subject_id: String,
    /// SCREAMING_SNAKE + error suffix, e.g. `REMOVE_USER-FORBIDDEN_ERROR`
    pub operation_code: String,
    /// PascalCase remainder, e.g. `RemoveUser`
    pub entity_name: String,
}

/// Derive audit names from a GraphQL operation name and a denial status
pub fn audit_names(operation: &str, status: u16) -> AuditNames {
    let stem = strip_verb_prefix(operation);
    let words = camel_words(stem);

    let (event_suffix, code_suffix) = if status == 401 {
        ("-unauthorized-error-event", "-UNAUTHORIZED_ERROR")
    } else {
        ("-forbidden-error-event", "-FORBIDDEN_ERROR")
    };

    let kebab = words.join("-");
    let screaming = words
        .iter()
        .map(|w| w.to_uppercase())
        .collect::<Vec<_>>()
        .join("_");

    let mut entity_name = String::with_capacity(stem.len());
    for word in &words {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            entity_name.extend(first.to_uppercase());
            entity_name.push_str(chars.as_str());
        }
    }

    AuditNames {
        subject_id: format!("{}{}", kebab, event_suffix),
        operation_code: format!("{}{}", screaming, code_suffix),
        entity_name,
    }
}

/// Strip one leading verb prefix when it is followed by an uppercase letter
fn strip_verb_prefix(operation: &str) -> &str {
    for prefix in VERB_PREFIXES {
        if let Some(rest) = operation.strip_prefix(prefix) {
            if rest.chars().next().is_some_and(|c| c.is_uppercase()) {
                return rest;
            }
        }
    }
    operation
}

/// Split a camelCase name into lowercase words
fn camel_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();

    for c in name.chars() {
        if c.is_uppercase() && !current.is_empty() {
            words.push(current.clone());
            current.clear();
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
}

/// Emit the decision side effects: always the analytics metric, plus an audit
/// event when the decision denied (status 401 or 403).
///
/// The decision exists before this runs; nothing here can change it.
pub async fn send_auth_metric(
    deps: &ServerDeps,
    session: &RequestSession,
    operation: &str,
    metric: AuthMetric,
    status: Option<u16>,
) {
    if let Err(e) = deps.analytics.send_metric(&metric).await {
        warn!(error = %e, operation, "Failed to send auth metric");
    }

    let status = match status {
        Some(status @ (401 | 403)) => status,
        _ => return,
    };

    let names = audit_names(operation, status);
    let event = AuditEvent {
        subject_id: names.subject_id,
        operation: names.operation_code,
        author_id: session.caller_id(),
        meta: AuditMeta {
            entity_name: names.entity_name,
            remote_ip_address: session.client_ip().map(|ip| ip.to_string()),
            entity_before_action: None,
            entity_after_action: None,
        },
    };

    deps.audit.send_event(event).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{MockAnalyticsChannel, TestDeps};

    #[test]
    fn forbidden_naming_transform() {
        let names = audit_names("removeUser", 403);
        assert_eq!(names.subject_id, "remove-user-forbidden-error-event");
        assert_eq!(names.operation_code, "REMOVE_USER-FORBIDDEN_ERROR");
        assert_eq!(names.entity_name, "RemoveUser");
    }

    #[test]
    fn unauthorized_naming_transform() {
        let names = audit_names("impersonateUser", 401);
        assert_eq!(names.subject_id, "impersonate-user-unauthorized-error-event");
        assert_eq!(names.operation_code, "IMPERSONATE_USER-UNAUTHORIZED_ERROR");
        assert_eq!(names.entity_name, "ImpersonateUser");
    }

    #[test]
    fn leading_verb_prefixes_are_stripped() {
        let names = audit_names("getUsers", 403);
        assert_eq!(names.subject_id, "users-forbidden-error-event");
        assert_eq!(names.operation_code, "USERS-FORBIDDEN_ERROR");
        assert_eq!(names.entity_name, "Users");

        // "list" alone is not a prefix match without a following uppercase
        let names = audit_names("listing", 403);
        assert_eq!(names.entity_name, "Listing");
    }

    #[tokio::test]
    async fn denied_status_emits_audit_event() {
        let deps = TestDeps::new();
        let server_deps = deps.build();
        let session = RequestSession::builder()
            .user_id("user-7")
            .client_ip("10.0.0.9".parse().unwrap())
            .build();

        let metric = AuthMetric {
            account: "test-account".to_string(),
            kind: AUTH_METRIC_KIND.to_string(),
            description: "denied".to_string(),
            fields: serde_json::json!({}),
        };

        send_auth_metric(&server_deps, &session, "removeUser", metric, Some(403)).await;

        let events = deps.audit.sent_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].subject_id, "remove-user-forbidden-error-event");
        assert_eq!(events[0].operation, "REMOVE_USER-FORBIDDEN_ERROR");
        assert_eq!(events[0].author_id.as_deref(), Some("user-7"));
        assert_eq!(events[0].meta.entity_name, "RemoveUser");
        assert_eq!(events[0].meta.remote_ip_address.as_deref(), Some("10.0.0.9"));
    }

    #[tokio::test]
    async fn allowed_decision_emits_metric_only() {
        let deps = TestDeps::new();
        let server_deps = deps.build();
        let session = RequestSession::builder().build();

        let metric = AuthMetric {
            account: "test-account".to_string(),
            kind: AUTH_METRIC_KIND.to_string(),
            description: "allowed".to_string(),
            fields: serde_json::json!({}),
        };

        send_auth_metric(&server_deps, &session, "getUsers", metric, None).await;

        assert_eq!(deps.analytics.sent_metrics().len(), 1);
        assert!(deps.audit.sent_events().is_empty());
    }

    #[tokio::test]
    async fn analytics_failure_is_swallowed() {
        let deps = TestDeps::new().with_analytics(MockAnalyticsChannel::new().failing());
        let server_deps = deps.build();
        let session = RequestSession::builder().build();

        let metric = AuthMetric {
            account: "test-account".to_string(),
            kind: AUTH_METRIC_KIND.to_string(),
            description: "denied".to_string(),
            fields: serde_json::json!({}),
        };

        // Must not panic or propagate; the audit event still goes out
        send_auth_metric(&server_deps, &session, "removeUser", metric, Some(403)).await;
        assert_eq!(deps.audit.sent_events().len(), 1);
    }
}
