//! Monotonic request tagging.
//!
//! Responses may resolve out of order. Each request takes a ticket; a
//! response is applied only while its ticket is still the latest one issued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use vswir_core::id::RequestSeq;

#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    latest: Arc<AtomicU64>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket; every earlier ticket becomes stale.
    pub fn issue(&self) -> RequestSeq {
        RequestSeq::new(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestSeq) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.get()
    }

    /// Make every outstanding ticket stale without issuing a new one.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}
