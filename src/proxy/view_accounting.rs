//! View accounting path
//!
//! Increments run as detached tasks so they never hold up forwarding, and a
//! client disconnect does not cancel an increment already under way. The
//! outcome is only logged.

use crate::domain::{ModifiedCount, StoreError, VideoKey, ViewStore};
use crate::proxy::types::RequestId;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Result of one increment attempt
#[derive(Debug)]
pub enum AccountingOutcome {
    /// No record existed; the upsert created it with one view
    Created,
    /// An existing record was incremented
    Incremented(ModifiedCount),
    Failed(StoreError),
    TimedOut(Duration),
}

/// Dispatches best-effort view increments against the shared store
#[derive(Clone)]
pub struct ViewAccountant {
    store: Arc<dyn ViewStore>,
    timeout: Duration,
}

impl ViewAccountant {
    pub fn new(store: Arc<dyn ViewStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> Arc<dyn ViewStore> {
        Arc::clone(&self.store)
    }

    /// Fire-and-forget view increment.
    pub fn record_view(&self, key: VideoKey, request_id: RequestId) {
        drop(self.spawn_increment(key, request_id));
    }

    /// Spawn an increment and hand back its handle.
    pub fn spawn_increment(
        &self,
        key: VideoKey,
        request_id: RequestId,
    ) -> JoinHandle<AccountingOutcome> {
        let store = Arc::clone(&self.store);
        let timeout = self.timeout;

        tokio::spawn(async move {
            info!(request_id = %request_id, video_key = %key, "Updating view count");
            let outcome = increment(store.as_ref(), &key, timeout).await;
            log_outcome(&outcome, &key, request_id);
            outcome
        })
    }
}

async fn increment(store: &dyn ViewStore, key: &VideoKey, timeout: Duration) -> AccountingOutcome {
    match tokio::time::timeout(timeout, store.increment_views(key)).await {
        Ok(Ok(modified)) if modified.created_record() => AccountingOutcome::Created,
        Ok(Ok(modified)) => AccountingOutcome::Incremented(modified),
        Ok(Err(e)) => AccountingOutcome::Failed(e),
        Err(_) => AccountingOutcome::TimedOut(timeout),
    }
}

fn log_outcome(outcome: &AccountingOutcome, key: &VideoKey, request_id: RequestId) {
    match outcome {
        AccountingOutcome::Created => {
            info!(request_id = %request_id, video_key = %key, "Created view record");
        }
        AccountingOutcome::Incremented(modified) => {
            info!(
                request_id = %request_id,
                video_key = %key,
                modified = *modified.as_ref(),
                "View count updated"
            );
        }
        AccountingOutcome::Failed(e) => {
            warn!(request_id = %request_id, video_key = %key, error = %e, "Failed to update view count");
        }
        AccountingOutcome::TimedOut(after) => {
            warn!(
                request_id = %request_id,
                video_key = %key,
                timeout_ms = after.as_millis() as u64,
                "View count update timed out"
            );
        }
    }
}
