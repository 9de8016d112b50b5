//! Query supersession.
//!
//! In-flight grid fetches are never aborted mid-network-call, but their
//! results must not land in the coverage cache once a newer query for the
//! same layer has started. A [`QueryGate`] hands out generation tickets;
//! beginning a new query bumps the generation and invalidates every ticket
//! issued before it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generation counter for one layer's queries.
#[derive(Debug, Clone, Default)]
pub struct QueryGate {
    generation: Arc<AtomicU64>,
}

impl QueryGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new query, superseding all previously issued tickets.
    #[must_use]
    pub fn begin(&self) -> QueryTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        QueryTicket {
            gate: Arc::clone(&self.generation),
            generation,
        }
    }
}

/// Proof that a query was the most recent one when checked.
#[derive(Debug, Clone)]
pub struct QueryTicket {
    gate: Arc<AtomicU64>,
    generation: u64,
}

impl QueryTicket {
    /// `true` while no newer query has begun on the same gate.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.gate.load(Ordering::SeqCst) == self.generation
    }
}
