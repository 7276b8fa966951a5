//! HTTP header constants and utilities for the proxy service

use ::http::header::{self, HeaderMap, HeaderName};

/// Chain of client addresses seen by each proxy hop
pub static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Host header the client originally sent
pub static X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Header name for request ID on proxy-generated error responses
pub const X_REQUEST_ID: &str = "x-request-id";

/// Separator between entries of `X-Forwarded-For`
pub const FORWARDED_FOR_SEPARATOR: &str = ", ";

/// Connection-scoped headers that must not travel past a proxy hop
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    for name in &named {
        headers.remove(name.as_str());
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(*name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::http::HeaderValue;

    #[test]
    fn test_header_constants() {
        assert!(X_FORWARDED_FOR.as_str().starts_with("x-"));
        assert!(X_FORWARDED_HOST.as_str().starts_with("x-"));
        assert!(X_REQUEST_ID.starts_with("x-"));
        assert!(HOP_BY_HOP_HEADERS
            .iter()
            .all(|name| name.chars().all(|c| !c.is_ascii_uppercase())));
    }

    #[test]
    fn strips_standard_hop_by_hop_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mp2t"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers[header::CONTENT_TYPE], "video/mp2t");
    }

    #[test]
    fn strips_headers_named_by_connection() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONNECTION,
            HeaderValue::from_static("close, X-Session-Hint"),
        );
        headers.insert("x-session-hint", HeaderValue::from_static("abc"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        strip_hop_by_hop(&mut headers);

        assert!(!headers.contains_key("x-session-hint"));
        assert!(!headers.contains_key(header::CONNECTION));
        assert!(headers.contains_key(header::ACCEPT));
    }
}
