//! View counter records and the store contract used to account for them

use crate::domain::video_key::VideoKey;
use async_trait::async_trait;
use nutype::nutype;
use thiserror::Error;

/// Number of pre-existing records an increment modified.
///
/// `0` means the record did not exist and was created by the upsert; it is
/// not a failure.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    AsRef,
    Display
))]
pub struct ModifiedCount(u64);

impl ModifiedCount {
    /// Whether the increment created the record instead of bumping it
    pub fn created_record(&self) -> bool {
        *self.as_ref() == 0
    }
}

/// Errors reported by a view store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Metadata store holding one view counter per video key
#[async_trait]
pub trait ViewStore: Send + Sync {
    /// Atomically add one view to `key`, creating the record with a single
    /// view when it does not exist yet.
    async fn increment_views(&self, key: &VideoKey) -> Result<ModifiedCount, StoreError>;

    /// Current counter for `key`, `None` if no record exists
    async fn views(&self, key: &VideoKey) -> Result<Option<i64>, StoreError>;
}
