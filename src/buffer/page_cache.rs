//! Bounded `PageId -> CachedPage` map with insertion/touch-order LRU
//! eviction.
//!
//! Grounded on `btree/page_cache.rs`'s per-category buffered-map shape
//! (here collapsed to a single map since heap pages are all one
//! category) and on
//! `other_examples/8484a72c_shoyo-jindb__src-buffer-manager.rs.rs`'s
//! evict-before-insert flow: the teacher's own `page_cache.rs` never
//! evicts anything (it is an unbounded multimap), so capacity bounding
//! and the eviction scan are grounded on shoyo-jindb's buffer manager
//! instead, expressed with the teacher's `Pod`/log idiom.
//!
//! `PageCache` has no notion of locks: it only knows a page's dirty
//! bit, never who holds it. Eviction candidacy for "is this page
//! locked by anyone" is supplied by the caller (the buffer manager,
//! which owns the lock table) as a predicate — this keeps NO STEAL's
//! real rule (never evict a dirty page) local to this module while
//! keeping the lock check where the lock state actually lives.

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::{page_id::PageId, transaction_id::TransactionId, types::Pod};

pub struct CachedPage {
    pub bytes: Vec<u8>,
    pub dirty_by: Option<TransactionId>,
}

impl CachedPage {
    fn new(bytes: Vec<u8>) -> Self {
        CachedPage {
            bytes,
            dirty_by: None,
        }
    }
}

pub struct PageCache {
    capacity: usize,
    pages: HashMap<PageId, Pod<CachedPage>>,
    // front = least recently touched, back = most recently touched.
    lru: VecDeque<PageId>,
}

impl PageCache {
    pub fn new(capacity: usize) -> Self {
        PageCache {
            capacity,
            pages: HashMap::new(),
            lru: VecDeque::new(),
        }
    }

    /// Pure lookup: does not disturb LRU order. A page read READ_ONLY
    /// and never dirtied must stay eligible for eviction at its
    /// original position — only a mutation re-touches it, via
    /// `touch_dirtied` below.
    pub fn get(&mut self, page_id: &PageId) -> Option<Pod<CachedPage>> {
        self.pages.get(page_id).cloned()
    }

    /// Look up a page without disturbing LRU order, for call sites
    /// (flush, dirty-owner checks) that read a page's state but
    /// shouldn't count as a "use" of it.
    pub fn peek(&self, page_id: &PageId) -> Option<Pod<CachedPage>> {
        self.pages.get(page_id).cloned()
    }

    /// Move a page to the MRU end of the eviction scan order. Called
    /// only when a page is dirtied (insert/delete), never on a plain
    /// read.
    pub fn touch_dirtied(&mut self, page_id: &PageId) {
        self.touch(page_id);
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_full(&self) -> bool {
        self.pages.len() >= self.capacity
    }

    /// Find the least-recently-touched page that `evictable` approves
    /// (i.e. isn't locked by any transaction) and isn't dirty, without
    /// removing it yet — eviction only actually happens once the
    /// caller decides what replaces it.
    pub fn find_victim(&self, evictable: impl Fn(&PageId) -> bool) -> Option<PageId> {
        self.lru
            .iter()
            .find(|page_id| {
                let page = self.pages.get(*page_id).expect("lru/pages out of sync");
                page.read().unwrap().dirty_by.is_none() && evictable(page_id)
            })
            .copied()
    }

    pub fn remove(&mut self, page_id: &PageId) {
        self.pages.remove(page_id);
        self.lru.retain(|p| p != page_id);
    }

    pub fn insert(&mut self, page_id: PageId, bytes: Vec<u8>) -> Pod<CachedPage> {
        debug!("page_cache: inserting page {}", page_id);
        let page = std::sync::Arc::new(std::sync::RwLock::new(CachedPage::new(bytes)));
        self.pages.insert(page_id, std::sync::Arc::clone(&page));
        self.lru.push_back(page_id);
        page
    }

    fn touch(&mut self, page_id: &PageId) {
        self.lru.retain(|p| p != page_id);
        self.lru.push_back(*page_id);
    }

    pub fn all_page_ids(&self) -> Vec<PageId> {
        self.pages.keys().copied().collect()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
        self.lru.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get_round_trips() {
        let mut cache = PageCache::new(2);
        let p1 = PageId::new(1, 0);
        cache.insert(p1, vec![1, 2, 3]);
        let got = cache.get(&p1).unwrap();
        assert_eq!(got.read().unwrap().bytes, vec![1, 2, 3]);
    }

    #[test]
    fn is_full_respects_capacity() {
        let mut cache = PageCache::new(1);
        assert!(!cache.is_full());
        cache.insert(PageId::new(1, 0), vec![]);
        assert!(cache.is_full());
    }

    #[test]
    fn find_victim_skips_dirty_pages() {
        let mut cache = PageCache::new(2);
        let p1 = PageId::new(1, 0);
        let p2 = PageId::new(1, 1);
        cache.insert(p1, vec![]);
        cache.insert(p2, vec![]);
        cache.get(&p1).unwrap().write().unwrap().dirty_by = Some(TransactionId::new());
        let victim = cache.find_victim(|_| true);
        assert_eq!(victim, Some(p2));
    }

    #[test]
    fn find_victim_honors_lock_predicate() {
        let mut cache = PageCache::new(2);
        let p1 = PageId::new(1, 0);
        let p2 = PageId::new(1, 1);
        cache.insert(p1, vec![]);
        cache.insert(p2, vec![]);
        // p1 is "locked" per the predicate, so p2 must be picked even
        // though p1 is less recently touched.
        let victim = cache.find_victim(|pid| *pid != p1);
        assert_eq!(victim, Some(p2));
    }

    #[test]
    fn find_victim_returns_none_when_all_dirty() {
        let mut cache = PageCache::new(2);
        let p1 = PageId::new(1, 0);
        cache.insert(p1, vec![]);
        cache.get(&p1).unwrap().write().unwrap().dirty_by = Some(TransactionId::new());
        assert_eq!(cache.find_victim(|_| true), None);
    }
}
