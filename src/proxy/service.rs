//! Main proxy service implementation
//!
//! The `ProxyService` is the HTTP entry point. Every request, whatever its
//! method or path, goes through the same handler:
//!
//! 1. If the path is a playlist manifest, a view increment is dispatched in
//!    the background (never awaited).
//! 2. The director rewrites the request for the upstream origin.
//! 3. The upstream response is streamed back unchanged.
//!
//! ## Service Lifecycle
//!
//! ```rust,ignore
//! use streamscale_proxy::proxy::{ProxyConfig, ProxyService};
//!
//! let service = ProxyService::new(ProxyConfig::new(upstream), store);
//! let router = service.into_router();
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(
//!     listener,
//!     router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
//! )
//! .await?;
//! ```

use crate::domain::{manifest_video_key, UpstreamTarget, ViewStore};
use crate::proxy::error_response::ErrorResponseExt;
use crate::proxy::hot_path::HotPathService;
use crate::proxy::middleware::logging_middleware;
use crate::proxy::types::*;
use crate::proxy::view_accounting::ViewAccountant;
use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    middleware::from_fn,
    response::Response,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

/// Proxy dispatcher combining the hot path and the view accounting path
pub struct ProxyService {
    hot_path: HotPathService,
    accountant: ViewAccountant,
}

impl ProxyService {
    /// Create a new proxy service around an already initialised view store
    pub fn new(config: ProxyConfig, store: Arc<dyn ViewStore>) -> Self {
        let accountant = ViewAccountant::new(store, config.accounting_timeout);
        let hot_path = HotPathService::new(config);

        Self {
            hot_path,
            accountant,
        }
    }

    pub fn upstream(&self) -> &UpstreamTarget {
        self.hot_path.upstream()
    }

    pub fn view_store(&self) -> Arc<dyn ViewStore> {
        self.accountant.store()
    }

    /// Create an Axum router that sends every request through the proxy
    pub fn into_router(self) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(Arc::new(self))
            .layer(from_fn(logging_middleware))
    }
}

/// Axum handler for proxying requests
async fn proxy_handler(
    State(proxy): State<Arc<ProxyService>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .copied()
        .unwrap_or_default();

    if let Some(key) = manifest_video_key(request.uri()) {
        proxy.accountant.record_view(key, request_id);
    }

    match proxy
        .hot_path
        .forward_request(request, remote, request_id)
        .await
    {
        Ok(response) => response,
        Err(error) => {
            warn!(request_id = %request_id, error = %error, "Forwarding failed");
            let status = error.status_code();
            error
                .to_error_response()
                .with_request_id(request_id.to_string())
                .into_response_with_status(status)
        }
    }
}
