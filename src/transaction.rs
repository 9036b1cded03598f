//! A transaction's lifetime: start, then exactly one of commit/abort.
//! Grounded on `transaction/tx.rs`'s `commit`/`abort` split, with the
//! ARIES log-record calls removed (recovery logging is out of scope —
//! `complete_transaction`'s FORCE/discard behavior on the buffer
//! manager is what stands in for the durability that logging would
//! otherwise provide).

use log::debug;

use crate::{
    buffer::BufferManager, database::Database, transaction_id::TransactionId, types::SmallResult,
};

pub struct Transaction {
    id: TransactionId,
}

impl Transaction {
    pub fn new() -> Self {
        let id = TransactionId::new();
        debug!("starting {}", id);
        Transaction { id }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn commit(&self) -> SmallResult {
        self.complete(true)
    }

    pub fn abort(&self) -> SmallResult {
        self.complete(false)
    }

    fn complete(&self, commit: bool) -> SmallResult {
        let db = Database::global();
        debug!("completing {} (commit: {})", self.id, commit);
        let catalog = db.catalog();
        db.buffer_manager()
            .complete_transaction(self.id, commit, &*catalog)
    }
}
