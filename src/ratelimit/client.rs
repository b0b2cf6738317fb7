//! Client identification for rate limiting and metrics.

use axum::http::{Extensions, HeaderMap};
use axum_client_ip::InsecureClientIp;

/// Identifier used when no header or peer address yields an IP.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derives a client identifier from proxy headers, falling back to the peer address.
///
/// Priority: leftmost `X-Forwarded-For` address, then `X-Real-IP`, then the
/// other common proxy headers, then the `ConnectInfo` peer.
pub fn client_id(headers: &HeaderMap, extensions: &Extensions) -> String {
    InsecureClientIp::from(headers, extensions)
        .map(|InsecureClientIp(ip)| ip.to_string())
        .unwrap_or_else(|_| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ConnectInfo;
    use axum::http::HeaderValue;
    use std::net::SocketAddr;

    fn peer(addr: &str) -> Extensions {
        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo(addr.parse::<SocketAddr>().unwrap()));
        extensions
    }

    #[test]
    fn test_forwarded_for_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));

        assert_eq!(client_id(&headers, &peer("127.0.0.1:5555")), "10.0.0.1");
    }

    #[test]
    fn test_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.7"));

        assert_eq!(client_id(&headers, &Extensions::new()), "192.168.1.7");
    }

    #[test]
    fn test_peer_fallback() {
        assert_eq!(client_id(&HeaderMap::new(), &peer("127.0.0.1:5555")), "127.0.0.1");
        assert_eq!(client_id(&HeaderMap::new(), &Extensions::new()), UNKNOWN_CLIENT);
    }
}
