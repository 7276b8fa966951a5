//! Middleware implementations for the proxy service

use crate::proxy::types::RequestId;
use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::info;

/// Logging middleware - logs request/response details with timing.
///
/// The request ID is generated here and travels in the request extensions so
/// the handler can tag its own log lines; it is never added to headers.
pub async fn logging_middleware(mut request: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = RequestId::generate();
    request.extensions_mut().insert(request_id);

    let method = request.method().clone();
    let uri = request.uri().clone();

    info!(
        request_id = %request_id,
        method = %method,
        path = %uri.path(),
        "Incoming request"
    );

    let response = next.run(request).await;
    let duration = start.elapsed();

    info!(
        request_id = %request_id,
        method = %method,
        path = %uri.path(),
        status = response.status().as_u16(),
        duration_ms = duration.as_millis() as u64,
        "Request completed"
    );

    response
}
