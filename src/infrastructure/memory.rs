//! In-process view store
//!
//! Same upsert semantics as the Postgres store. Useful for tests and for
//! running the proxy without a database.

use crate::domain::{ModifiedCount, StoreError, VideoKey, ViewStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct InMemoryViewStore {
    counters: Mutex<HashMap<VideoKey, i64>>,
}

impl InMemoryViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct video keys with a counter
    pub fn len(&self) -> usize {
        self.counters.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.lock().is_empty()
    }
}

#[async_trait]
impl ViewStore for InMemoryViewStore {
    async fn increment_views(&self, key: &VideoKey) -> Result<ModifiedCount, StoreError> {
        let mut counters = self.counters.lock();
        let modified = match counters.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                *entry.get_mut() += 1;
                1
            }
            Entry::Vacant(entry) => {
                entry.insert(1);
                0
            }
        };
        Ok(ModifiedCount::new(modified))
    }

    async fn views(&self, key: &VideoKey) -> Result<Option<i64>, StoreError> {
        Ok(self.counters.lock().get(key).copied())
    }
}
