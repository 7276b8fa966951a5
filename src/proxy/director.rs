//! Request rewriting for the upstream origin
//!
//! The director turns an inbound request into the request sent upstream. It
//! runs for every request, manifest or not:
//!
//! - URI scheme, authority and path are moved onto the upstream origin
//! - `Host` becomes the upstream host
//! - `X-Forwarded-For` gains the client address
//! - `X-Forwarded-Host` records the `Host` the client sent
//! - hop-by-hop headers are dropped; everything else passes through

use crate::domain::UpstreamTarget;
use crate::proxy::headers::{
    strip_hop_by_hop, FORWARDED_FOR_SEPARATOR, X_FORWARDED_FOR, X_FORWARDED_HOST,
};
use crate::proxy::types::*;
use http::header::HOST;
use http::request::Parts;
use http::{HeaderMap, HeaderValue, Version};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Director {
    upstream: Arc<UpstreamTarget>,
}

impl Director {
    pub fn new(upstream: UpstreamTarget) -> Self {
        Self {
            upstream: Arc::new(upstream),
        }
    }

    pub fn upstream(&self) -> &UpstreamTarget {
        &self.upstream
    }

    /// Rewrite request parts in place so they target the upstream origin.
    pub fn direct(&self, parts: &mut Parts, remote: SocketAddr) -> ProxyResult<()> {
        // Captured before any mutation; HTTP/2 clients carry it in the URI.
        let original_host = parts.headers.get(HOST).cloned().or_else(|| {
            parts
                .uri
                .authority()
                .and_then(|authority| HeaderValue::from_str(authority.as_str()).ok())
        });

        parts.uri = self
            .upstream
            .rewrite_uri(&parts.uri)
            .map_err(|e| ProxyError::InvalidRequestUri(e.to_string()))?;
        parts.version = Version::HTTP_11;

        strip_hop_by_hop(&mut parts.headers);

        let forwarded_for = forwarded_for_chain(&parts.headers, remote.ip())?;
        parts.headers.insert(&X_FORWARDED_FOR, forwarded_for);

        if let Some(host) = original_host {
            parts.headers.insert(&X_FORWARDED_HOST, host);
        }
        parts
            .headers
            .insert(HOST, self.upstream.host_header().clone());

        Ok(())
    }
}

/// Existing `X-Forwarded-For` entries followed by the client address.
///
/// Prior values are joined byte for byte, so entries that are not valid
/// UTF-8 survive the hop.
fn forwarded_for_chain(headers: &HeaderMap, client: IpAddr) -> ProxyResult<HeaderValue> {
    let mut chain: Vec<u8> = Vec::new();
    for value in headers.get_all(&X_FORWARDED_FOR) {
        let entry = value.as_bytes().trim_ascii();
        if entry.is_empty() {
            continue;
        }
        chain.extend_from_slice(entry);
        chain.extend_from_slice(FORWARDED_FOR_SEPARATOR.as_bytes());
    }
    chain.extend_from_slice(client.to_canonical().to_string().as_bytes());

    HeaderValue::from_bytes(&chain).map_err(|_| ProxyError::InvalidHeader {
        name: X_FORWARDED_FOR.to_string(),
    })
}
