//! Client identity extraction for per-client rate limiting.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Header set by most reverse proxies with the original client chain.
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Header set by nginx-style proxies with the original client address.
const X_REAL_IP: &str = "x-real-ip";

/// Key used when no client address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derives the rate-limit key for a request.
///
/// When `behind_proxy` is `true` the first valid address in `X-Forwarded-For`
/// wins, then `X-Real-IP`. Otherwise (or when both headers are missing or
/// malformed) the socket peer address is used. Proxy headers are ignored when
/// `behind_proxy` is `false` since any client can forge them.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
///
/// assert_eq!(client_key(&headers, None, true), "203.0.113.7");
/// assert_eq!(client_key(&headers, None, false), "unknown");
/// ```
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, behind_proxy: bool) -> String {
    if behind_proxy && let Some(ip) = forwarded_ip(headers) {
        return ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let from_forwarded_for = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());

    from_forwarded_for.or_else(|| {
        headers
            .get(X_REAL_IP)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("192.168.1.10:54321".parse().unwrap())
    }

    #[test]
    fn test_client_key_uses_peer_address() {
        let headers = HeaderMap::new();
        assert_eq!(client_key(&headers, peer(), false), "192.168.1.10");
    }

    #[test]
    fn test_client_key_ignores_proxy_headers_when_not_behind_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("203.0.113.7"));

        assert_eq!(client_key(&headers, peer(), false), "192.168.1.10");
    }

    #[test]
    fn test_client_key_first_forwarded_address_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            X_FORWARDED_FOR,
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert(X_REAL_IP, HeaderValue::from_static("198.51.100.2"));

        assert_eq!(client_key(&headers, peer(), true), "203.0.113.7");
    }

    #[test]
    fn test_client_key_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("garbage"));
        headers.insert(X_REAL_IP, HeaderValue::from_static("198.51.100.2"));

        assert_eq!(client_key(&headers, peer(), true), "198.51.100.2");
    }

    #[test]
    fn test_client_key_ipv6_peer() {
        let headers = HeaderMap::new();
        let peer: SocketAddr = "[::1]:8080".parse().unwrap();

        assert_eq!(client_key(&headers, Some(peer), true), "::1");
    }

    #[test]
    fn test_client_key_unknown_without_peer() {
        let headers = HeaderMap::new();
        assert_eq!(client_key(&headers, None, false), UNKNOWN_CLIENT);
    }
}
