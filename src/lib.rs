//! Streamscale proxy - a reverse proxy in front of an HLS origin
//!
//! Every request is forwarded to the configured origin and streamed back.
//! Requests for a video's master playlist additionally bump that video's
//! view counter in the background, without ever delaying or failing the
//! proxied response.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod proxy;

pub use application::Application;
pub use error::{Error, Result};
