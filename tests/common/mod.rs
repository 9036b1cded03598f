//! Shared test scaffolding: a `HeapFile`-backed `PageStore` under a
//! unique temp path per call, so tests can drive `BufferManager`
//! directly without going through the process-wide `Database`
//! singleton (and without racing each other over shared config).

use std::sync::{atomic::{AtomicUsize, Ordering}, Arc, RwLock};

use txdb::{
    buffer::PageStore,
    config,
    error::SmallError,
    field::{Field, Type},
    heap::{HeapFile, HeapTable},
    page_id::PageId,
    schema::Schema,
    types::{Pod, SmallResult},
};

static NEXT_TABLE_ID: AtomicUsize = AtomicUsize::new(1);

fn next_table_id() -> i32 {
    NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed) as i32
}

pub fn temp_heap_file() -> HeapFile {
    let table_id = next_table_id();
    let path = std::env::temp_dir().join(format!(
        "txdb-buffer-manager-test-{}-{}.db",
        std::process::id(),
        table_id
    ));
    HeapFile::new(table_id, path)
}

/// A fresh, empty single-`Int64`-column table backed by its own temp
/// file, for operator-level tests that need a real `HeapTable` rather
/// than a bare `HeapFile`.
pub fn temp_heap_table() -> Pod<HeapTable> {
    let table_id = next_table_id();
    let path = std::env::temp_dir().join(format!(
        "txdb-scan-test-{}-{}.db",
        std::process::id(),
        table_id
    ));
    let file = HeapFile::new(table_id, path);
    let schema = Arc::new(Schema::new(vec![Field::new("v", Type::Int64)]));
    Arc::new(RwLock::new(HeapTable::new(table_id, schema, file)))
}

/// Allocate `count` fresh zeroed pages in `file` and return their ids.
pub fn allocate_pages(file: &HeapFile, count: usize) -> Vec<PageId> {
    (0..count).map(|_| file.allocate_page().unwrap()).collect()
}

pub fn page_of(byte: u8) -> Vec<u8> {
    vec![byte; config::page_size()]
}

/// A `PageStore` that delegates reads to a real `HeapFile` but always
/// fails writes, for exercising commit's I/O-error path without
/// touching disk.
pub struct FailingWriteStore(pub HeapFile);

impl PageStore for FailingWriteStore {
    fn read_page(&self, page_id: &PageId) -> Result<Vec<u8>, SmallError> {
        self.0.read_page(page_id)
    }

    fn write_page(&self, _page_id: &PageId, _bytes: &[u8]) -> SmallResult {
        Err(SmallError::io("simulated disk write failure"))
    }
}
