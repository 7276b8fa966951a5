use crate::domain::{StoreError, UpstreamError};
use thiserror::Error;

/// Errors that stop the service from starting or serving
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("View store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid upstream: {0}")]
    InvalidUpstream(#[from] UpstreamError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
