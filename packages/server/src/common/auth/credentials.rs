//! Credential extraction: which raw credential material is on the request.
//!
//! Pure inspection of the session bag, no network validation. Absence is
//! represented by omission, never by an error.

use super::session::{RequestSession, API_APP_KEY_HEADER, API_APP_TOKEN_HEADER};

/// One candidate credential, tagged by kind.
///
/// Priority order is fixed: context admin token, admin token found verbatim
/// in the request header, API key/secret pair, store user token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    AdminToken(String),
    HeaderAdminToken(String),
    ApiKeyPair { key: String, secret: String },
    StoreToken(String),
}

/// Extract every credential present on the request, in priority order
pub fn extract_credentials(session: &RequestSession) -> Vec<Credential> {
    let mut credentials = Vec::new();

    if let Some(token) = session.admin_token().filter(|t| !t.is_empty()) {
        credentials.push(Credential::AdminToken(token));
    }

    if let Some(token) = session.header_admin_token().filter(|t| !t.is_empty()) {
        credentials.push(Credential::HeaderAdminToken(token));
    }

    if let Some((key, secret)) = api_key_pair(session) {
        credentials.push(Credential::ApiKeyPair { key, secret });
    }

    if let Some(token) = session.store_token().filter(|t| !t.is_empty()) {
        credentials.push(Credential::StoreToken(token));
    }

    credentials
}

/// An API key/secret pair counts as present only when both parts are
/// non-empty strings
pub fn api_key_pair(session: &RequestSession) -> Option<(String, String)> {
    let key = session.header(API_APP_KEY_HEADER)?.trim();
    let secret = session.header(API_APP_TOKEN_HEADER)?.trim();

    if key.is_empty() || secret.is_empty() {
        return None;
    }

    Some((key.to_string(), secret.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_follows_priority_order() {
        let session = RequestSession::builder()
            .admin_token("ctx")
            .header_admin_token("raw")
            .api_key_pair("key", "secret")
            .store_token("store")
            .build();

        let credentials = extract_credentials(&session);

        assert_eq!(
            credentials,
            vec![
                Credential::AdminToken("ctx".to_string()),
                Credential::HeaderAdminToken("raw".to_string()),
                Credential::ApiKeyPair {
                    key: "key".to_string(),
                    secret: "secret".to_string()
                },
                Credential::StoreToken("store".to_string()),
            ]
        );
    }

    #[test]
    fn absent_credentials_are_omitted() {
        let session = RequestSession::builder().store_token("store").build();

        let credentials = extract_credentials(&session);
        assert_eq!(credentials, vec![Credential::StoreToken("store".to_string())]);
    }

    #[test]
    fn api_pair_requires_both_parts() {
        let session = RequestSession::builder()
            .header(API_APP_KEY_HEADER, "key-only")
            .build();
        assert_eq!(api_key_pair(&session), None);

        let session = RequestSession::builder().api_key_pair("key", "").build();
        assert_eq!(api_key_pair(&session), None);

        let session = RequestSession::builder().api_key_pair("key", "secret").build();
        assert_eq!(
            api_key_pair(&session),
            Some(("key".to_string(), "secret".to_string()))
        );
    }
}
