//! `HeapTable`: a schema paired with a [`HeapFile`], and the
//! insert/delete/scan operations the query operators drive it
//! through. Grounded on `table.rs`'s `HeapTable`, generalized off its
//! hardcoded 4-byte-int-only layout, with the insert path's
//! scan-then-upgrade-then-release shape modeled on the B-tree insert
//! path (`btree/table/insert.rs`) translated to heap-file terms: no
//! splitting, no parent pointers, just "find a page with a free slot,
//! or append a new one".

use std::sync::Arc;

use log::debug;

use crate::{
    buffer::BufferManager,
    cell::Cell,
    error::SmallError,
    heap::{file::HeapFile, page_layout},
    page_id::PageId,
    permission::Permission,
    schema::Schema,
    transaction_id::TransactionId,
    tuple::Tuple,
    types::SmallResult,
};

pub struct HeapTable {
    pub table_id: i32,
    pub schema: Arc<Schema>,
    file: HeapFile,
}

impl HeapTable {
    pub fn new(table_id: i32, schema: Arc<Schema>, file: HeapFile) -> Self {
        HeapTable {
            table_id,
            schema,
            file,
        }
    }

    pub fn num_pages(&self) -> Result<usize, SmallError> {
        self.file.num_pages()
    }

    pub fn file(&self) -> &HeapFile {
        &self.file
    }

    /// Insert `cells` into the first page with a free slot, appending
    /// a new page if every existing one is full. Pages that are
    /// scanned read-only and turn out to be full are released
    /// immediately rather than held until the transaction ends, so a
    /// long insert doesn't starve concurrent readers of pages it never
    /// ends up writing to.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        bm: &BufferManager,
        cells: Vec<Cell>,
    ) -> SmallResult {
        let tuple = Tuple::new(Arc::clone(&self.schema), cells);
        let num_pages = self.num_pages()?;

        for index in 0..num_pages {
            let page_id = PageId::new(self.table_id, index);
            let page = bm.get_page(tid, &page_id, Permission::ReadOnly, &self.file)?;
            let has_room = {
                let guard = page.read().unwrap();
                page_layout::first_free_slot(&guard.bytes, &self.schema).is_some()
            };

            if !has_room {
                bm.unsafe_release(tid, &page_id);
                continue;
            }

            // upgrade to a write lock now that we know this is the page.
            let page = bm.get_page(tid, &page_id, Permission::ReadWrite, &self.file)?;
            let mut guard = page.write().unwrap();
            let slot = page_layout::first_free_slot(&guard.bytes, &self.schema)
                .expect("checked above under the read lock");
            page_layout::write_tuple(&mut guard.bytes, slot, &self.schema, &tuple);
            drop(guard);
            bm.mark_dirty(tid, &page_id);
            debug!("inserted tuple into {} slot {}", page_id, slot);
            return Ok(());
        }

        let page_id = self.file.allocate_page()?;
        let page = bm.get_page(tid, &page_id, Permission::ReadWrite, &self.file)?;
        let mut guard = page.write().unwrap();
        guard.bytes = page_layout::empty_page(&self.schema);
        page_layout::write_tuple(&mut guard.bytes, 0, &self.schema, &tuple);
        drop(guard);
        bm.mark_dirty(tid, &page_id);
        debug!("inserted tuple into freshly allocated page {}", page_id);
        Ok(())
    }

    pub fn delete_tuple(
        &self,
        tid: TransactionId,
        bm: &BufferManager,
        page_id: &PageId,
        slot: usize,
    ) -> SmallResult {
        let page = bm.get_page(tid, page_id, Permission::ReadWrite, &self.file)?;
        let mut guard = page.write().unwrap();
        page_layout::clear_slot(&mut guard.bytes, slot, &self.schema);
        drop(guard);
        bm.mark_dirty(tid, page_id);
        Ok(())
    }

    /// Every tuple resident on `page_index`, for the sequential scan
    /// operator to drive page by page.
    pub fn read_page_tuples(
        &self,
        tid: TransactionId,
        bm: &BufferManager,
        page_index: usize,
    ) -> Result<Vec<Tuple>, SmallError> {
        let page_id = PageId::new(self.table_id, page_index);
        let page = bm.get_page(tid, &page_id, Permission::ReadOnly, &self.file)?;
        let guard = page.read().unwrap();
        let tuples = page_layout::used_slots(&guard.bytes, &self.schema)
            .into_iter()
            .map(|slot| {
                page_layout::read_tuple(&guard.bytes, Arc::clone(&self.schema), slot)
                    .with_record_id(crate::tuple::RecordId { page_id, slot })
            })
            .collect();
        Ok(tuples)
    }
}
