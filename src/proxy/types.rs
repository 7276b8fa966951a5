//! Type definitions for the proxy module

use crate::domain::UpstreamTarget;
use nutype::nutype;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// How long to wait for upstream response headers
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on a single view increment
pub const DEFAULT_ACCOUNTING_TIMEOUT: Duration = Duration::from_secs(2);

/// Request ID correlating log lines of one exchange
#[nutype(derive(Clone, Copy, Debug, Display, PartialEq, Eq, AsRef))]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn generate() -> Self {
        // Uuid::now_v7() keeps IDs time-ordered in the logs
        Self::new(Uuid::now_v7())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::generate()
    }
}

/// Proxy configuration
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    /// Origin every request is forwarded to
    pub upstream: UpstreamTarget,
    /// Timeout for receiving upstream response headers
    pub request_timeout: Duration,
    /// Timeout for a single view increment
    pub accounting_timeout: Duration,
}

impl ProxyConfig {
    pub fn new(upstream: UpstreamTarget) -> Self {
        Self {
            upstream,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            accounting_timeout: DEFAULT_ACCOUNTING_TIMEOUT,
        }
    }
}

/// Errors on the forwarding path. Every variant ends the exchange with an
/// error response to the client.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("Upstream request failed: {0}")]
    UpstreamFailed(String),

    #[error("Upstream timed out after {0:?}")]
    UpstreamTimeout(Duration),

    #[error("Invalid request URI: {0}")]
    InvalidRequestUri(String),

    #[error("Invalid header: {name}")]
    InvalidHeader { name: String },
}

/// Result type for proxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;
