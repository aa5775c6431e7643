//! Client identity for rate limiting.
//!
//! The first `X-Forwarded-For` hop is trusted as-is. A client that controls
//! that header can rotate identities and evade per-client throttling, so
//! deployments must strip or overwrite it at the edge proxy. This identity is
//! used for abuse throttling only, never for authentication.

use std::net::SocketAddr;

use axum::http::HeaderMap;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Identifier used when neither a forwarded hop nor a peer address is known.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derive the client identifier: first forwarded hop, else the peer IP.
pub fn client_identifier(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty());

    match (forwarded, peer) {
        (Some(hop), _) => hop.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => UNKNOWN_CLIENT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.7:51234".parse().unwrap())
    }

    #[test]
    fn test_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static(" 203.0.113.9 , 10.0.0.1"));
        assert_eq!(client_identifier(&headers, peer()), "203.0.113.9");
    }

    #[test]
    fn test_peer_fallback() {
        assert_eq!(client_identifier(&HeaderMap::new(), peer()), "10.0.0.7");

        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static(" , 10.0.0.1"));
        assert_eq!(client_identifier(&headers, peer()), "10.0.0.7");
    }

    #[test]
    fn test_unknown_client() {
        assert_eq!(client_identifier(&HeaderMap::new(), None), UNKNOWN_CLIENT);
    }
}
