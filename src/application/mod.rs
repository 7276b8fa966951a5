//! Application wiring
//!
//! Loads settings, connects the view store and runs the proxy server.

pub mod app;

pub use app::Application;
