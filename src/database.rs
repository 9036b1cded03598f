//! Process-wide singleton: the `Catalog` and the `BufferManager` that
//! every transaction, operator and SQL handler reaches through.
//!
//! Grounded on the teacher's `utils.rs` `Unique`/`HandyRwLock` pattern
//! and `database.rs`'s `OnceCell`-based `Database::global()`, kept as
//! the safe `once_cell::sync::OnceCell` variant rather than the
//! teacher's older `Once` + raw-pointer + `mem::transmute` singleton —
//! `once_cell` is already in the teacher's own dependency list.

use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::OnceCell;

use crate::{
    buffer::BufferManager,
    catalog::Catalog,
    config,
    heap::{HeapFile, HeapTable},
    schema::Schema,
    types::Pod,
    utils::HandyRwLock,
};

static DB: OnceCell<Database> = OnceCell::new();

pub struct Database {
    catalog: RwLock<Catalog>,
    buffer_manager: BufferManager,
    data_dir: PathBuf,
}

impl Database {
    fn new() -> Database {
        Database {
            catalog: RwLock::new(Catalog::new()),
            buffer_manager: BufferManager::new(config::buffer_pool_pages()),
            data_dir: std::env::temp_dir(),
        }
    }

    pub fn global() -> &'static Database {
        DB.get_or_init(Database::new)
    }

    pub fn catalog(&self) -> RwLockReadGuard<Catalog> {
        self.catalog.rl()
    }

    pub fn catalog_mut(&self) -> RwLockWriteGuard<Catalog> {
        self.catalog.wl()
    }

    pub fn buffer_manager(&self) -> &BufferManager {
        &self.buffer_manager
    }

    /// Create a fresh, empty heap table backed by a file under the
    /// process's data directory and register it in the catalog.
    /// Returns the new table's id.
    pub fn create_table(&self, name: &str, schema: Schema) -> i32 {
        let table_id = Catalog::next_table_id();
        let path = self.data_dir.join(format!("table-{}.db", table_id));
        let file = HeapFile::new(table_id, path);
        let table: Pod<HeapTable> =
            std::sync::Arc::new(RwLock::new(HeapTable::new(table_id, std::sync::Arc::new(schema), file)));
        self.catalog_mut().add_table(name, table);
        table_id
    }

    /// Test-only: reset the global buffer manager and catalog to a
    /// clean slate by swapping in a brand-new `Database`. Cannot touch
    /// the `OnceCell` itself (it is set exactly once per process), so
    /// this only clears what lives behind `catalog`/`buffer_manager`.
    #[cfg(test)]
    pub fn reset_catalog_for_test(&self) {
        *self.catalog.wl() = Catalog::new();
        self.buffer_manager.clear_for_test();
    }
}
