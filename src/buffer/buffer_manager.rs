//! The transactional buffer pool's façade. Owns the page cache and the
//! lock table together so it can enforce NO STEAL (never evict a page
//! a live transaction has dirtied) and FORCE (write every dirty page
//! back before a commit returns) in one place.
//!
//! Grounded on `bufferpool.rs`'s flat `get_page` shape against a
//! `HashMap<PageId, ...>`, and on `transaction/tx.rs`'s `commit`/
//! `abort` (force-flush-then-release; discard-dirty-then-release),
//! with the per-page dirty bit moved from `ConcurrentStatus` (which
//! tracked it per-transaction in the teacher) onto `CachedPage` itself
//! (which transaction dirtied a page is exactly the information
//! needed at commit/abort, and keeping it on the page avoids a second
//! map that could drift out of sync with the cache).

use std::collections::HashSet;

use log::debug;

use crate::{
    error::SmallError,
    page_id::PageId,
    permission::Permission,
    transaction_id::TransactionId,
    types::{Pod, SmallResult},
};

use super::{
    lock_table::LockTable,
    page_cache::{CachedPage, PageCache},
};

/// A single table's page store: produce and persist a page's raw
/// bytes. Kept as a trait so the buffer manager doesn't depend on
/// `HeapFile` directly — only on "a table can be read and written
/// page by page", the same seam the teacher draws between
/// `BufferPool` and `Catalog::get_table`.
pub trait PageStore: Send + Sync {
    fn read_page(&self, page_id: &PageId) -> Result<Vec<u8>, SmallError>;
    fn write_page(&self, page_id: &PageId, bytes: &[u8]) -> SmallResult;
}

/// Resolves a page id to whichever table's store owns it. A single
/// `PageStore` only ever sees its own table's pages (an insert/scan
/// already knows which table it's working against), but a
/// transaction's dirty set can span tables, so flush/discard at
/// commit/abort go through this instead. `Catalog` is the only real
/// implementor; any `PageStore` also works as a (trivial,
/// single-table) registry.
pub trait PageStoreRegistry: Send + Sync {
    fn read_page(&self, page_id: &PageId) -> Result<Vec<u8>, SmallError>;
    fn write_page(&self, page_id: &PageId, bytes: &[u8]) -> SmallResult;
}

impl<T: PageStore> PageStoreRegistry for T {
    fn read_page(&self, page_id: &PageId) -> Result<Vec<u8>, SmallError> {
        PageStore::read_page(self, page_id)
    }

    fn write_page(&self, page_id: &PageId, bytes: &[u8]) -> SmallResult {
        PageStore::write_page(self, page_id, bytes)
    }
}

pub struct BufferManager {
    cache: std::sync::Mutex<PageCache>,
    lock_table: LockTable,
}

impl BufferManager {
    pub fn new(capacity: usize) -> Self {
        BufferManager {
            cache: std::sync::Mutex::new(PageCache::new(capacity)),
            lock_table: LockTable::new(),
        }
    }

    /// Acquire the page under the given transaction and permission,
    /// blocking (and possibly aborting on deadlock) until the lock is
    /// granted, reading it from `registry` on a cache miss and
    /// evicting a clean/unlocked victim if the cache is full.
    pub fn get_page(
        &self,
        tid: TransactionId,
        page_id: &PageId,
        perm: Permission,
        registry: &dyn PageStoreRegistry,
    ) -> Result<Pod<CachedPage>, SmallError> {
        self.lock_table.acquire_lock(tid, page_id, perm)?;

        let mut cache = self.cache.lock().unwrap();
        if let Some(page) = cache.get(page_id) {
            return Ok(page);
        }

        if cache.is_full() {
            self.evict_locked(&mut cache)?;
        }

        let bytes = registry.read_page(page_id)?;
        Ok(cache.insert(*page_id, bytes))
    }

    /// Mark a page dirty under `tid`. Called by the heap table after
    /// it mutates a page's bytes in place, never by the cache itself —
    /// the cache has no notion of what "dirty" means beyond the bit.
    pub fn mark_dirty(&self, tid: TransactionId, page_id: &PageId) {
        let mut cache = self.cache.lock().unwrap();
        if let Some(page) = cache.get(page_id) {
            page.write().unwrap().dirty_by = Some(tid);
            cache.touch_dirtied(page_id);
        }
    }

    /// Release a single page lock without ending the transaction, used
    /// when a scan has finished with a page it upgraded but the
    /// transaction itself continues.
    pub fn unsafe_release(&self, tid: TransactionId, page_id: &PageId) {
        self.lock_table.release_lock(tid, page_id);
    }

    pub fn holds_lock(&self, tid: TransactionId, page_id: &PageId) -> bool {
        self.lock_table.holds_lock(tid, page_id)
    }

    /// FORCE at commit: flush every page `tid` dirtied, then release
    /// its locks. Discard-at-abort: drop every page `tid` dirtied from
    /// the cache (forcing a clean re-read from disk next time) instead
    /// of flushing it, then release its locks.
    pub fn complete_transaction(
        &self,
        tid: TransactionId,
        commit: bool,
        registry: &dyn PageStoreRegistry,
    ) -> SmallResult {
        let dirtied = self.dirtied_pages(tid);
        let mut first_err = None;

        if commit {
            for page_id in &dirtied {
                if let Err(err) = self.flush_page(page_id, registry) {
                    first_err.get_or_insert(err);
                }
            }
        } else {
            for page_id in &dirtied {
                debug!("reloading dirty page {} from disk on abort of {}", page_id, tid);
                if let Err(err) = self.reload_page(page_id, registry) {
                    first_err.get_or_insert(err);
                }
            }
        }

        // locks must be freed even if a page failed to flush/reload,
        // or every other transaction waiting on them blocks forever.
        self.lock_table.release_all(tid);

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn dirtied_pages(&self, tid: TransactionId) -> HashSet<PageId> {
        let cache = self.cache.lock().unwrap();
        cache
            .all_page_ids()
            .into_iter()
            .filter(|page_id| {
                cache
                    .peek(page_id)
                    .map_or(false, |page| page.read().unwrap().dirty_by == Some(tid))
            })
            .collect()
    }

    fn flush_page(&self, page_id: &PageId, registry: &dyn PageStoreRegistry) -> SmallResult {
        let cache = self.cache.lock().unwrap();
        if let Some(page) = cache.peek(page_id) {
            let bytes = page.read().unwrap().bytes.clone();
            registry.write_page(page_id, &bytes)?;
            page.write().unwrap().dirty_by = None;
        }
        Ok(())
    }

    /// Abort-time rollback: overwrite a dirtied page's bytes with a
    /// fresh read from disk and clear its dirty bit, in place. The
    /// cache entry itself is preserved (not removed) so any handle a
    /// caller is still holding keeps pointing at valid, now-clean data
    /// instead of a page that could be silently re-created under the
    /// same id.
    fn reload_page(&self, page_id: &PageId, registry: &dyn PageStoreRegistry) -> SmallResult {
        let cache = self.cache.lock().unwrap();
        if let Some(page) = cache.peek(page_id) {
            let bytes = registry.read_page(page_id)?;
            let mut guard = page.write().unwrap();
            guard.bytes = bytes;
            guard.dirty_by = None;
        }
        Ok(())
    }

    /// Flush every dirty page in the cache regardless of owner. Not on
    /// the hot commit/abort path (`complete_transaction` only ever
    /// touches one transaction's pages) — kept for an explicit
    /// checkpoint/shutdown call site, mirroring the teacher's
    /// `flush_all_pages`.
    pub fn flush_all(&self, registry: &dyn PageStoreRegistry) -> SmallResult {
        let page_ids = self.cache.lock().unwrap().all_page_ids();
        for page_id in page_ids {
            self.flush_page(&page_id, registry)?;
        }
        Ok(())
    }

    pub fn discard_page(&self, page_id: &PageId) {
        self.cache.lock().unwrap().remove(page_id);
    }

    /// Drop every resident page without flushing. Only meaningful
    /// between tests sharing the global `Database` singleton, never on
    /// a live transaction's hot path.
    #[cfg(test)]
    pub fn clear_for_test(&self) {
        self.cache.lock().unwrap().clear();
    }

    fn evict_locked(&self, cache: &mut PageCache) -> SmallResult {
        let victim = cache.find_victim(|page_id| !self.lock_table.is_page_locked(page_id));
        match victim {
            Some(page_id) => {
                debug!("evicting clean page {}", page_id);
                cache.remove(&page_id);
                Ok(())
            }
            None => Err(SmallError::resource_exhausted(
                "buffer pool full: every resident page is dirty or locked",
            )),
        }
    }
}
