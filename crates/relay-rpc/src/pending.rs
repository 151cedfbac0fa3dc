use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::debug;

use tabwire_core_types::ResultEnvelope;

/// Correlation table for in-flight calls.
///
/// Settlement is exactly-once by construction: both the response path and
/// the timeout path go through a single `remove`, so whichever fires first
/// owns the entry and the loser finds nothing to do.
#[derive(Default)]
pub struct PendingCalls {
    next_id: AtomicU64,
    table: DashMap<u64, oneshot::Sender<ResultEnvelope>>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh correlation id and park a responder for it.
    pub fn register(&self) -> (u64, oneshot::Receiver<ResultEnvelope>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = oneshot::channel();
        self.table.insert(id, tx);
        (id, rx)
    }

    /// Route a response to its caller. Returns false when the call was
    /// already settled (timed out) or never existed.
    pub fn settle(&self, response: ResultEnvelope) -> bool {
        match self.table.remove(&response.id) {
            Some((id, tx)) => {
                if tx.send(response).is_err() {
                    debug!(target: "relay-rpc", id, "caller gone before response arrived");
                }
                true
            }
            None => false,
        }
    }

    /// Drop an entry on timeout. Returns false if a response won the race.
    pub fn abandon(&self, id: u64) -> bool {
        self.table.remove(&id).is_some()
    }

    pub fn in_flight(&self) -> usize {
        self.table.len()
    }
}
