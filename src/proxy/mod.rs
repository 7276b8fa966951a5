//! Reverse proxy in front of the content-delivery origin
//!
//! This module implements the dual-path architecture:
//! - Hot path: rewrite and forward every request, streaming both bodies
//! - Accounting path: background view increments for playlist manifests

pub mod director;
pub mod error_response;
pub mod headers;
pub mod hot_path;
pub mod middleware;
pub mod service;
pub mod types;
pub mod view_accounting;

#[cfg(test)]
pub(crate) mod test_utils;


pub use director::Director;
pub use service::ProxyService;
pub use types::{ProxyConfig, ProxyError, ProxyResult, RequestId};
pub use view_accounting::{AccountingOutcome, ViewAccountant};
