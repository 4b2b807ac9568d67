//! Keystroke coalescing for interactive location search.
//!
//! Every submission takes a generation number. A submission only reaches the
//! network if no newer one arrived during the quiet period, and its results
//! are only handed back if no newer one arrived while it was in flight. The
//! latest query wins regardless of which response lands first.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use crate::{error::Result, location::LocationStore, model::Location};

#[derive(Debug)]
pub struct SearchDebouncer {
    store: Arc<LocationStore>,
    quiet: Duration,
    generation: AtomicU64,
}

impl SearchDebouncer {
    pub fn new(store: Arc<LocationStore>, quiet: Duration) -> Self {
        Self { store, quiet, generation: AtomicU64::new(0) }
    }

    /// Search for `query` once input has been quiet for the configured period.
    ///
    /// Returns `Ok(None)` when a newer submission (or [`cancel`](Self::cancel))
    /// superseded this one. Callers typically spawn one task per keystroke.
    pub async fn submit(&self, query: impl Into<String>) -> Result<Option<Vec<Location>>> {
        let query = query.into();
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.quiet).await;
        if !self.is_latest(ticket) {
            tracing::trace!(query = %query, "search superseded before dispatch");
            return Ok(None);
        }

        let result = self.store.search(&query).await;
        if !self.is_latest(ticket) {
            tracing::debug!(query = %query, "discarding stale search response");
            return Ok(None);
        }

        result.map(Some)
    }

    /// Drop every pending submission, e.g. when the search box closes.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn is_latest(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }
}
