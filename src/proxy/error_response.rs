//! Error responses produced by the proxy itself
//!
//! Only forwarding failures reach the client. They are rendered as a small
//! JSON body carrying the request ID so operators can find the matching logs.

use crate::proxy::headers::X_REQUEST_ID;
use crate::proxy::types::ProxyError;
use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Standard error response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Unique error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Request ID for correlation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Convert to HTTP response with proper headers
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        let request_id = self.request_id.clone();
        let mut response = (status, Json(self)).into_response();

        if let Some(id) = request_id {
            if let Ok(header_value) = HeaderValue::from_str(&id) {
                response.headers_mut().insert(X_REQUEST_ID, header_value);
            }
        }

        response
    }
}

/// Extension trait for consistent error formatting
pub trait ErrorResponseExt {
    fn to_error_response(&self) -> ErrorResponse;

    fn status_code(&self) -> StatusCode;
}

impl ErrorResponseExt for ProxyError {
    fn to_error_response(&self) -> ErrorResponse {
        use ProxyError::*;

        let code = match self {
            UpstreamUnreachable(_) => "UPSTREAM_UNREACHABLE",
            UpstreamFailed(_) => "UPSTREAM_ERROR",
            UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            InvalidRequestUri(_) => "INVALID_REQUEST_URI",
            InvalidHeader { .. } => "INVALID_HEADER",
        };
        ErrorResponse::new(code, self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        use ProxyError::*;

        match self {
            UpstreamUnreachable(_) | UpstreamFailed(_) => StatusCode::BAD_GATEWAY,
            UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            InvalidRequestUri(_) | InvalidHeader { .. } => StatusCode::BAD_REQUEST,
        }
    }
}
