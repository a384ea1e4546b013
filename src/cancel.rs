//! Per-generation cancellation tokens for in-flight provider fan-outs.
//!
//! Every logical query gets a token carrying its generation id. Issuing a
//! new token supersedes all older ones; completion handlers check their
//! token before touching shared state, so a late response from a stale
//! generation can never clobber a newer one regardless of arrival order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Allocator for query generations.
#[derive(Debug, Default)]
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, superseding every outstanding token.
    pub fn issue(&self) -> QueryToken {
        let id = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        QueryToken {
            id,
            current: Arc::clone(&self.current),
        }
    }

    /// Supersede all outstanding tokens without starting a new query
    /// (used when the administrative scope changes under a pending search).
    pub fn invalidate_all(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }
}

/// Handle identifying one query generation.
#[derive(Debug, Clone)]
pub struct QueryToken {
    id: u64,
    current: Arc<AtomicU64>,
}

impl QueryToken {
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.id
    }

    pub fn is_cancelled(&self) -> bool {
        !self.is_current()
    }
}
