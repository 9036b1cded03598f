//! The on-disk half of a table: a flat file of fixed-size pages.
//! Grounded on `table.rs`'s `HeapTable::read_page`/`get_num_pages`
//! (seek-by-`page_index * page_size`, fixed 4096-byte pages), rebuilt
//! on top of `SmallFile`'s page-at-offset primitives instead of
//! reaching for `std::fs::File` directly so page I/O errors come back
//! as `SmallError` everywhere else in the crate does.

use std::{path::Path, sync::Mutex};

use crate::{
    buffer::PageStore, config, error::SmallError, io::SmallFile, page_id::PageId,
    types::SmallResult,
};

pub struct HeapFile {
    table_id: i32,
    file: Mutex<SmallFile>,
}

impl HeapFile {
    pub fn new<P: AsRef<Path>>(table_id: i32, path: P) -> Self {
        HeapFile {
            table_id,
            file: Mutex::new(SmallFile::new(path)),
        }
    }

    pub fn num_pages(&self) -> Result<usize, SmallError> {
        let size = self.file.lock().unwrap().get_size()?;
        Ok((size as usize + config::page_size() - 1) / config::page_size())
    }

    /// Append a fresh zeroed page and return its id.
    pub fn allocate_page(&self) -> Result<PageId, SmallError> {
        let index = self.num_pages()?;
        let page_id = PageId::new(self.table_id, index);
        self.file
            .lock()
            .unwrap()
            .write_page_at(index, &vec![0u8; config::page_size()])?;
        Ok(page_id)
    }
}

impl PageStore for HeapFile {
    fn read_page(&self, page_id: &PageId) -> Result<Vec<u8>, SmallError> {
        debug_assert_eq!(page_id.table_id, self.table_id);
        self.file
            .lock()
            .unwrap()
            .read_page_at(page_id.page_index, config::page_size())
    }

    fn write_page(&self, page_id: &PageId, bytes: &[u8]) -> SmallResult {
        debug_assert_eq!(page_id.table_id, self.table_id);
        self.file.lock().unwrap().write_page_at(page_id.page_index, bytes)
    }
}
