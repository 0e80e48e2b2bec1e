//! Client IP resolution for audit records. The service runs behind the
//! platform edge, so proxy headers outrank the socket peer address.

use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, SocketAddr};

/// Resolved caller address, inserted into request extensions
#[derive(Clone, Copy, Debug)]
pub struct ClientIp(pub IpAddr);

/// Caller address according to the proxy headers. `x-forwarded-for` carries
/// the original caller as its first entry and shadows `x-real-ip` when set.
fn proxied_ip(headers: &HeaderMap) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        return forwarded
            .to_str()
            .ok()?
            .split(',')
            .next()?
            .trim()
            .parse()
            .ok();
    }

    headers
        .get("x-real-ip")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

pub async fn extract_client_ip(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut request: Request,
    next: Next,
) -> Response {
    let ip = proxied_ip(request.headers()).unwrap_or_else(|| peer.ip());
    request.extensions_mut().insert(ClientIp(ip));

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_takes_the_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));

        assert_eq!(proxied_ip(&headers), Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn real_ip_applies_without_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));

        assert_eq!(proxied_ip(&headers), Some("10.0.0.2".parse().unwrap()));
    }

    #[test]
    fn unparseable_proxy_headers_resolve_to_none() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));

        assert_eq!(proxied_ip(&headers), None);
    }
}
