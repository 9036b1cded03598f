//! Monotonically increasing transaction identifiers. Unlike an earlier
//! draft of this type, ids are never random — two concurrently-started
//! transactions must never collide, and the lock table uses id order
//! only for logging, never for priority.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    pub fn new() -> Self {
        let id = NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed);
        TransactionId(id)
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "tx{}", self.0)
    }
}
