//! Request-scoped session bag consumed by the guard chain.
//!
//! Built once per request by the transport middleware from the raw header
//! map. All credential material lives here; the admin-token slot and cookie
//! jar are settable because a validated header token or an exchanged API
//! token gets promoted into them mid-request.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::RwLock;

use super::permissions::PermissionSet;

/// Untrusted admin session cookie, validated through its own call path
pub const ADMIN_SESSION_COOKIE: &str = "b2b_admin_session";
/// Storefront end-user session cookie
pub const STORE_SESSION_COOKIE: &str = "b2b_store_session";
pub const API_APP_KEY_HEADER: &str = "x-api-app-key";
pub const API_APP_TOKEN_HEADER: &str = "x-api-app-token";
/// Caller-app override for permission-check scoping
pub const SENDER_APP_HEADER: &str = "x-b2b-sender-app";

const ORGANIZATION_HEADER: &str = "x-b2b-organization";
const COST_CENTER_HEADER: &str = "x-b2b-cost-center";
const USER_ID_HEADER: &str = "x-b2b-user-id";
const PROFILE_EMAIL_HEADER: &str = "x-b2b-profile-email";

/// Parsed storefront session namespaces, extracted once per request
#[derive(Debug, Clone, Default)]
pub struct SessionNamespaces {
    pub organization: Option<String>,
    pub cost_center: Option<String>,
    pub user_id: Option<String>,
    pub email: Option<String>,
}

/// Mutable per-request slots. Guards run concurrently under the GraphQL
/// executor; last-write-wins is acceptable because every written value is a
/// pure function of the request's credentials.
#[derive(Default)]
struct SessionState {
    admin_token: RwLock<Option<String>>,
    cookies: RwLock<HashMap<String, String>>,
    /// Outer None = not resolved yet; inner None = resolved to "no permissions"
    permissions: RwLock<Option<Option<PermissionSet>>>,
}

/// Per-request credential and scope material
pub struct RequestSession {
    headers: HashMap<String, String>,
    client_ip: Option<IpAddr>,
    store_token: Option<String>,
    namespaces: SessionNamespaces,
    /// Persisted-query sender parsed from GraphQL extensions by the route
    sender_app: Option<String>,
    state: SessionState,
}

impl RequestSession {
    /// Parse a raw header map (lowercased names) into a session
    pub fn from_headers(
        headers: HashMap<String, String>,
        client_ip: Option<IpAddr>,
        sender_app: Option<String>,
    ) -> Self {
        let cookies = parse_cookie_header(headers.get("cookie").map(String::as_str));

        // The Authorization bearer token is the context-bound admin credential;
        // the admin session cookie stays a separate, untrusted candidate.
        let admin_token = headers
            .get("authorization")
            .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).to_string())
            .filter(|t| !t.is_empty());

        let store_token = cookies.get(STORE_SESSION_COOKIE).cloned();

        let namespaces = SessionNamespaces {
            organization: headers.get(ORGANIZATION_HEADER).cloned(),
            cost_center: headers.get(COST_CENTER_HEADER).cloned(),
            user_id: headers.get(USER_ID_HEADER).cloned(),
            email: headers.get(PROFILE_EMAIL_HEADER).cloned(),
        };

        Self {
            headers,
            client_ip,
            store_token,
            namespaces,
            sender_app,
            state: SessionState {
                admin_token: RwLock::new(admin_token),
                cookies: RwLock::new(cookies),
                permissions: RwLock::new(None),
            },
        }
    }

    pub fn builder() -> RequestSessionBuilder {
        RequestSessionBuilder::default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn client_ip(&self) -> Option<IpAddr> {
        self.client_ip
    }

    pub fn namespaces(&self) -> &SessionNamespaces {
        &self.namespaces
    }

    pub fn sender_app(&self) -> Option<&str> {
        self.sender_app.as_deref()
    }

    /// Admin token currently bound to the request context
    pub fn admin_token(&self) -> Option<String> {
        self.state.admin_token.read().unwrap().clone()
    }

    pub fn set_admin_token(&self, token: &str) {
        *self.state.admin_token.write().unwrap() = Some(token.to_string());
    }

    pub fn clear_admin_token(&self) {
        *self.state.admin_token.write().unwrap() = None;
    }

    /// Raw admin session cookie value, distinct from the context-bound token
    pub fn header_admin_token(&self) -> Option<String> {
        self.cookie(ADMIN_SESSION_COOKIE)
    }

    pub fn store_token(&self) -> Option<String> {
        self.store_token.clone()
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.state.cookies.read().unwrap().get(name).cloned()
    }

    pub fn set_cookie(&self, name: &str, value: &str) {
        self.state
            .cookies
            .write()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }

    /// Memoized permission-set slot (None = not yet resolved this request)
    pub fn permission_memo(&self) -> Option<Option<PermissionSet>> {
        self.state.permissions.read().unwrap().clone()
    }

    pub fn memoize_permissions(&self, resolved: Option<PermissionSet>) {
        *self.state.permissions.write().unwrap() = Some(resolved);
    }

    /// Caller identity for audit records: session user id, else profile email
    pub fn caller_id(&self) -> Option<String> {
        self.namespaces
            .user_id
            .clone()
            .or_else(|| self.namespaces.email.clone())
    }
}

fn parse_cookie_header(value: Option<&str>) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    if let Some(raw) = value {
        for pair in raw.split(';') {
            if let Some((name, val)) = pair.trim().split_once('=') {
                cookies.insert(name.trim().to_string(), val.trim().to_string());
            }
        }
    }
    cookies
}

/// Assembles a RequestSession piece by piece (transport layer and tests)
#[derive(Default)]
pub struct RequestSessionBuilder {
    headers: HashMap<String, String>,
    client_ip: Option<IpAddr>,
    admin_token: Option<String>,
    header_admin_token: Option<String>,
    store_token: Option<String>,
    namespaces: SessionNamespaces,
    sender_app: Option<String>,
}

impl RequestSessionBuilder {
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    /// Context-bound admin token (already attached by the platform edge)
    pub fn admin_token(mut self, token: &str) -> Self {
        self.admin_token = Some(token.to_string());
        self
    }

    /// Raw admin session cookie value
    pub fn header_admin_token(mut self, token: &str) -> Self {
        self.header_admin_token = Some(token.to_string());
        self
    }

    pub fn api_key_pair(mut self, key: &str, secret: &str) -> Self {
        self.headers
            .insert(API_APP_KEY_HEADER.to_string(), key.to_string());
        self.headers
            .insert(API_APP_TOKEN_HEADER.to_string(), secret.to_string());
        self
    }

    pub fn store_token(mut self, token: &str) -> Self {
        self.store_token = Some(token.to_string());
        self
    }

    pub fn organization(mut self, org_id: &str) -> Self {
        self.namespaces.organization = Some(org_id.to_string());
        self
    }

    pub fn cost_center(mut self, cost_center_id: &str) -> Self {
        self.namespaces.cost_center = Some(cost_center_id.to_string());
        self
    }

    pub fn user_id(mut self, user_id: &str) -> Self {
        self.namespaces.user_id = Some(user_id.to_string());
        self
    }

    pub fn email(mut self, email: &str) -> Self {
        self.namespaces.email = Some(email.to_string());
        self
    }

    pub fn sender_app(mut self, sender: &str) -> Self {
        self.sender_app = Some(sender.to_string());
        self
    }

    pub fn build(self) -> RequestSession {
        let mut cookies = HashMap::new();
        if let Some(token) = &self.header_admin_token {
            cookies.insert(ADMIN_SESSION_COOKIE.to_string(), token.clone());
        }
        if let Some(token) = &self.store_token {
            cookies.insert(STORE_SESSION_COOKIE.to_string(), token.clone());
        }

        RequestSession {
            headers: self.headers,
            client_ip: self.client_ip,
            store_token: self.store_token,
            namespaces: self.namespaces,
            sender_app: self.sender_app,
            state: SessionState {
                admin_token: RwLock::new(self.admin_token),
                cookies: RwLock::new(cookies),
                permissions: RwLock::new(None),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cookies_and_bearer_token() {
        let mut headers = HashMap::new();
        headers.insert("authorization".to_string(), "Bearer ctx-token".to_string());
        headers.insert(
            "cookie".to_string(),
            "b2b_admin_session=raw-admin; b2b_store_session=store-tok".to_string(),
        );

        let session = RequestSession::from_headers(headers, None, None);

        assert_eq!(session.admin_token().as_deref(), Some("ctx-token"));
        assert_eq!(session.header_admin_token().as_deref(), Some("raw-admin"));
        assert_eq!(session.store_token().as_deref(), Some("store-tok"));
    }

    #[test]
    fn admin_slot_is_settable_and_clearable() {
        let session = RequestSession::builder().admin_token("first").build();

        session.set_admin_token("second");
        assert_eq!(session.admin_token().as_deref(), Some("second"));

        session.clear_admin_token();
        assert_eq!(session.admin_token(), None);
    }

    #[test]
    fn empty_bearer_header_is_no_credential() {
        let mut headers = HashMap::new();
        headers.insert("authorization".to_string(), "Bearer ".to_string());

        let session = RequestSession::from_headers(headers, None, None);
        assert_eq!(session.admin_token(), None);
    }
}
