//! Hot path: forward one request upstream and stream the response back
//!
//! Bodies are never buffered. The request body is handed to the upstream
//! client as it arrives and the upstream body is returned to axum as-is, so
//! segment downloads and chunked responses flow through at network speed.
//! Dropping the returned response (client went away) drops the upstream
//! connection with it.

use crate::domain::UpstreamTarget;
use crate::proxy::director::Director;
use crate::proxy::headers::strip_hop_by_hop;
use crate::proxy::types::*;
use axum::body::Body;
use hyper::{Request, Response};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::error::Error as _;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Pooled client used for every upstream request
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Streaming hot path service
#[derive(Clone)]
pub struct HotPathService {
    config: Arc<ProxyConfig>,
    director: Director,
    client: UpstreamClient,
}

impl HotPathService {
    pub fn new(config: ProxyConfig) -> Self {
        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(TokioExecutor::new())
            .http1_title_case_headers(true)
            .http1_preserve_header_case(true)
            .build(connector);

        Self {
            director: Director::new(config.upstream.clone()),
            config: Arc::new(config),
            client,
        }
    }

    pub fn upstream(&self) -> &UpstreamTarget {
        self.director.upstream()
    }

    /// Forward a request to the upstream origin.
    ///
    /// Only the wait for response headers is bounded by the request timeout;
    /// body streaming is not.
    pub async fn forward_request(
        &self,
        request: Request<Body>,
        remote: SocketAddr,
        request_id: RequestId,
    ) -> ProxyResult<Response<Body>> {
        let start_time = Instant::now();

        let (mut parts, body) = request.into_parts();
        self.director.direct(&mut parts, remote)?;

        debug!(
            request_id = %request_id,
            method = %parts.method,
            upstream_uri = %parts.uri,
            "Forwarding request upstream"
        );

        let outgoing_request = Request::from_parts(parts, body);
        let timeout_duration = self.config.request_timeout;

        let response = tokio::time::timeout(timeout_duration, self.client.request(outgoing_request))
            .await
            .map_err(|_| ProxyError::UpstreamTimeout(timeout_duration))?
            .map_err(classify_client_error)?;

        let (mut response_parts, response_body) = response.into_parts();
        strip_hop_by_hop(&mut response_parts.headers);

        debug!(
            request_id = %request_id,
            status = response_parts.status.as_u16(),
            duration_ms = start_time.elapsed().as_millis() as u64,
            "Upstream responded"
        );

        Ok(Response::from_parts(response_parts, Body::new(response_body)))
    }
}

fn classify_client_error(err: hyper_util::client::legacy::Error) -> ProxyError {
    let message = match err.source() {
        Some(source) => format!("{err}: {source}"),
        None => err.to_string(),
    };

    if err.is_connect() {
        ProxyError::UpstreamUnreachable(message)
    } else {
        ProxyError::UpstreamFailed(message)
    }
}
