//! In-memory table directory. Grounded on the root `database.rs`'s
//! `Catalog` (flat `table_id -> Arc<RwLock<HeapTable>>` map); the
//! on-disk system catalog table in `btree/catalog.rs` is B-tree- and
//! schema-evolution-specific and stays out of scope here — tables
//! exist for the lifetime of the process only.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicI32, Ordering},
};

use crate::{
    buffer::PageStoreRegistry, error::SmallError, heap::HeapTable, page_id::PageId,
    types::{Pod, SmallResult},
};

static NEXT_TABLE_ID: AtomicI32 = AtomicI32::new(1);

pub struct Catalog {
    tables: HashMap<i32, Pod<HeapTable>>,
    name_to_id: HashMap<String, i32>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            tables: HashMap::new(),
            name_to_id: HashMap::new(),
        }
    }

    pub fn next_table_id() -> i32 {
        NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed)
    }

    pub fn add_table(&mut self, name: &str, table: Pod<HeapTable>) {
        let table_id = table.read().unwrap().table_id;
        self.tables.insert(table_id, table);
        self.name_to_id.insert(name.to_string(), table_id);
    }

    pub fn get_table(&self, table_id: i32) -> Option<Pod<HeapTable>> {
        self.tables.get(&table_id).cloned()
    }

    pub fn table_id_by_name(&self, name: &str) -> Option<i32> {
        self.name_to_id.get(name).copied()
    }
}

impl PageStoreRegistry for Catalog {
    fn read_page(&self, page_id: &PageId) -> Result<Vec<u8>, SmallError> {
        let table = self
            .get_table(page_id.table_id)
            .ok_or_else(|| SmallError::bad_input(&format!("unknown table {}", page_id.table_id)))?;
        let guard = table.read().unwrap();
        guard.file().read_page(page_id)
    }

    fn write_page(&self, page_id: &PageId, bytes: &[u8]) -> SmallResult {
        let table = self
            .get_table(page_id.table_id)
            .ok_or_else(|| SmallError::bad_input(&format!("unknown table {}", page_id.table_id)))?;
        let guard = table.read().unwrap();
        guard.file().write_page(page_id, bytes)
    }
}
