//! `Insert`/`Delete`: thin wrappers over [`crate::heap::HeapTable`]'s
//! insert/delete that carry a transaction id, matching the interface
//! level at which spec.md §6 exposes `insert_tuple`/`delete_tuple` to
//! operators.

use crate::{
    buffer::BufferManager, cell::Cell, error::SmallError, heap::HeapTable,
    transaction_id::TransactionId, tuple::Tuple,
    types::{Pod, SmallResult},
};

pub struct Insert<'bm> {
    tid: TransactionId,
    bm: &'bm BufferManager,
    table: Pod<HeapTable>,
}

impl<'bm> Insert<'bm> {
    pub fn new(tid: TransactionId, bm: &'bm BufferManager, table: Pod<HeapTable>) -> Self {
        Insert { tid, bm, table }
    }

    pub fn insert(&self, cells: Vec<Cell>) -> SmallResult {
        self.table.read().unwrap().insert_tuple(self.tid, self.bm, cells)
    }
}

pub struct Delete<'bm> {
    tid: TransactionId,
    bm: &'bm BufferManager,
    table: Pod<HeapTable>,
}

impl<'bm> Delete<'bm> {
    pub fn new(tid: TransactionId, bm: &'bm BufferManager, table: Pod<HeapTable>) -> Self {
        Delete { tid, bm, table }
    }

    /// Delete a tuple previously produced by a scan over this same
    /// table — `tuple.record_id` is how the scan remembers where it
    /// came from.
    pub fn delete(&self, tuple: &Tuple) -> SmallResult {
        let record_id = tuple
            .record_id
            .ok_or_else(|| SmallError::bad_input("cannot delete a tuple with no record id"))?;
        self.table
            .read()
            .unwrap()
            .delete_tuple(self.tid, self.bm, &record_id.page_id, record_id.slot)
    }
}
