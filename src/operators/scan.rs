//! Full table scan: one `READ_ONLY` page at a time through the buffer
//! manager. Grounded on the teacher's `sequential_scan.rs` shape,
//! generalized off its single hardcoded table schema.

use crate::{heap::HeapTable, transaction_id::TransactionId, tuple::Tuple, types::Pod};

pub struct SequentialScan<'bm> {
    tid: TransactionId,
    bm: &'bm crate::buffer::BufferManager,
    table: Pod<HeapTable>,
    page_index: usize,
    buffered: std::vec::IntoIter<Tuple>,
}

impl<'bm> SequentialScan<'bm> {
    pub fn new(tid: TransactionId, bm: &'bm crate::buffer::BufferManager, table: Pod<HeapTable>) -> Self {
        let mut scan = SequentialScan {
            tid,
            bm,
            table,
            page_index: 0,
            buffered: Vec::new().into_iter(),
        };
        scan.load_first_page();
        scan
    }

    /// Reset the scan back to the first page, re-reading it. Matches
    /// the teacher's `rewind()` semantics: the same transaction keeps
    /// whatever locks it already acquired (2PL forbids releasing
    /// early), it just starts handing out tuples from the top again.
    pub fn rewind(&mut self) {
        self.page_index = 0;
        self.load_first_page();
    }

    /// A table with no pages yet (nothing inserted since it was
    /// created) must never touch the buffer manager: `get_page` would
    /// acquire and hold a `READ_ONLY` lock on page 0 before discovering
    /// it doesn't exist on disk, blocking a concurrent `INSERT`'s first
    /// write to that same not-yet-allocated page for no reason.
    fn load_first_page(&mut self) {
        let num_pages = self.table.read().unwrap().num_pages().unwrap_or(0);
        if num_pages == 0 {
            self.buffered = Vec::new().into_iter();
            return;
        }
        self.load_page(0);
    }

    fn load_page(&mut self, page_index: usize) {
        let tuples = self
            .table
            .read()
            .unwrap()
            .read_page_tuples(self.tid, self.bm, page_index)
            .unwrap_or_default();
        self.buffered = tuples.into_iter();
    }
}

impl<'bm> Iterator for SequentialScan<'bm> {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        loop {
            if let Some(tuple) = self.buffered.next() {
                return Some(tuple);
            }

            let num_pages = self.table.read().unwrap().num_pages().unwrap_or(0);
            self.page_index += 1;
            if self.page_index >= num_pages {
                return None;
            }
            self.load_page(self.page_index);
        }
    }
}
