//! Domain types for the playlist view-counting proxy
//!
//! Everything in here is free of I/O except the [`ViewStore`] contract,
//! which the infrastructure layer implements.

pub mod upstream;
pub mod video_key;
pub mod views;

pub use upstream::{UpstreamError, UpstreamTarget};
pub use video_key::{derive_video_key, manifest_video_key, VideoKey};
pub use views::{ModifiedCount, StoreError, ViewStore};
