//! Page-granularity two-phase lock table.
//!
//! Grounded on `transaction/concurrent_status.rs` (map shapes,
//! idempotent `add_lock`/`release_lock` split, the single
//! `modification_lock` critical section) and the older
//! `concurrent_status.rs` (the plain `Lock`/`Permission` enums this
//! crate reuses via [`crate::permission`]). The teacher blocks by
//! polling `sleep(10ms)` in a loop with a fixed 3-second timeout; this
//! rewrite blocks on a [`Condvar`] instead, woken on every release,
//! which is how `other_examples/47d5426a_motedb-motedb__src-txn-lock_manager.rs.rs`
//! frames the same problem (its own lock manager fails fast rather
//! than actually waiting, so only the waking *idea* — not its code —
//! is carried over).
//!
//! Deadlocks are detected synchronously at acquire time via the
//! waits-for graph: before a requester blocks, it checks whether
//! waiting on the current holders would close a cycle back to itself.
//! If so the requester aborts immediately — it is always the
//! requester that aborts, never an incumbent holder, matching spec's
//! required tie-breaking rule.

use std::{
    collections::{HashMap, HashSet},
    sync::{Condvar, Mutex},
};

use log::debug;

use crate::{
    error::SmallError,
    page_id::PageId,
    permission::{Lock, Permission},
    transaction_id::TransactionId,
    types::SmallResult,
};

use super::wait_for_graph::WaitForGraph;

struct State {
    s_holders: HashMap<PageId, HashSet<TransactionId>>,
    x_holders: HashMap<PageId, TransactionId>,
    held_pages: HashMap<TransactionId, HashSet<PageId>>,
    wait_for: WaitForGraph,
}

impl State {
    fn new() -> Self {
        State {
            s_holders: HashMap::new(),
            x_holders: HashMap::new(),
            held_pages: HashMap::new(),
            wait_for: WaitForGraph::new(),
        }
    }

    fn holds(&self, tid: TransactionId, page_id: &PageId) -> Option<Lock> {
        if self.x_holders.get(page_id) == Some(&tid) {
            return Some(Lock::XLock);
        }
        if self
            .s_holders
            .get(page_id)
            .map_or(false, |s| s.contains(&tid))
        {
            return Some(Lock::SLock);
        }
        None
    }

    fn blockers(&self, tid: TransactionId, page_id: &PageId, lock: Lock) -> HashSet<TransactionId> {
        let mut blockers = HashSet::new();
        match lock {
            Lock::SLock => {
                if let Some(&holder) = self.x_holders.get(page_id) {
                    if holder != tid {
                        blockers.insert(holder);
                    }
                }
            }
            Lock::XLock => {
                if let Some(&holder) = self.x_holders.get(page_id) {
                    if holder != tid {
                        blockers.insert(holder);
                    }
                }
                if let Some(s) = self.s_holders.get(page_id) {
                    for &holder in s {
                        if holder != tid {
                            blockers.insert(holder);
                        }
                    }
                }
            }
        }
        blockers
    }

    fn grant(&mut self, tid: TransactionId, page_id: PageId, lock: Lock) {
        match lock {
            Lock::SLock => {
                self.s_holders.entry(page_id).or_insert_with(HashSet::new).insert(tid);
            }
            Lock::XLock => {
                // an upgrade from SLock drops the caller's own shared
                // entry for this page only, never the whole map.
                if let Some(s) = self.s_holders.get_mut(&page_id) {
                    s.remove(&tid);
                    if s.is_empty() {
                        self.s_holders.remove(&page_id);
                    }
                }
                self.x_holders.insert(page_id, tid);
            }
        }
        self.held_pages.entry(tid).or_insert_with(HashSet::new).insert(page_id);
        self.wait_for.remove_transaction(tid);
    }

    fn release_page(&mut self, tid: TransactionId, page_id: &PageId) {
        if let Some(s) = self.s_holders.get_mut(page_id) {
            s.remove(&tid);
            if s.is_empty() {
                self.s_holders.remove(page_id);
            }
        }
        if self.x_holders.get(page_id) == Some(&tid) {
            self.x_holders.remove(page_id);
        }
        if let Some(pages) = self.held_pages.get_mut(&tid) {
            pages.remove(page_id);
        }
    }

    fn release_all(&mut self, tid: TransactionId) -> HashSet<PageId> {
        let pages = self.held_pages.remove(&tid).unwrap_or_default();
        for page_id in &pages {
            self.release_page(tid, page_id);
        }
        self.wait_for.remove_transaction(tid);
        pages
    }
}

pub struct LockTable {
    state: Mutex<State>,
    released: Condvar,
}

impl LockTable {
    pub fn new() -> Self {
        LockTable {
            state: Mutex::new(State::new()),
            released: Condvar::new(),
        }
    }

    /// Acquire the lock implied by `perm` on `page_id` for `tid`,
    /// blocking until it is available. Returns an aborted error if
    /// granting it would deadlock; the caller must then discard its
    /// work and release whatever it already holds.
    pub fn acquire_lock(
        &self,
        tid: TransactionId,
        page_id: &PageId,
        perm: Permission,
    ) -> SmallResult {
        let lock = perm.to_lock();
        let mut state = self.state.lock().unwrap();

        loop {
            if let Some(held) = state.holds(tid, page_id) {
                if held == Lock::XLock || lock == Lock::SLock {
                    return Ok(());
                }
                // held SLock, want XLock: try to upgrade below.
            }

            let blockers = state.blockers(tid, page_id, lock);
            if blockers.is_empty() {
                debug!("lock granted, tid: {}, page_id: {}, lock: {:?}", tid, page_id, lock);
                state.grant(tid, *page_id, lock);
                return Ok(());
            }

            // re-waiting replaces tid's whole adjacency set rather than
            // accumulating onto it, so a stale edge from an earlier
            // iteration (the holder it used to wait on, since released)
            // can never be walked by a later cycle check.
            state.wait_for.set_edges(tid, blockers.clone());

            let deadlocked = blockers
                .iter()
                .any(|&blocker| state.wait_for.creates_cycle(tid, blocker));
            if deadlocked {
                state.wait_for.set_edges(tid, HashSet::new());
                debug!("deadlock detected, aborting requester tid: {}", tid);
                return Err(SmallError::aborted(&format!(
                    "deadlock detected while tid {} waited on page {}",
                    tid, page_id
                )));
            }

            debug!("lock blocked, tid: {}, page_id: {}, lock: {:?}, waiting on {:?}", tid, page_id, lock, blockers);
            state = self.released.wait(state).unwrap();
        }
    }

    /// Release a single page lock held by `tid`, without completing
    /// the transaction. Used when a scan upgrades then releases a page
    /// it no longer needs before the transaction ends.
    pub fn release_lock(&self, tid: TransactionId, page_id: &PageId) {
        let mut state = self.state.lock().unwrap();
        state.release_page(tid, page_id);
        self.released.notify_all();
    }

    /// Release every page held by `tid`, returning the set released,
    /// so the caller (the buffer manager, at commit/abort) knows which
    /// pages to flush or discard.
    pub fn release_all(&self, tid: TransactionId) -> HashSet<PageId> {
        let mut state = self.state.lock().unwrap();
        let pages = state.release_all(tid);
        self.released.notify_all();
        pages
    }

    pub fn holds_lock(&self, tid: TransactionId, page_id: &PageId) -> bool {
        self.state.lock().unwrap().holds(tid, page_id).is_some()
    }

    pub fn is_page_locked(&self, page_id: &PageId) -> bool {
        let state = self.state.lock().unwrap();
        state.x_holders.contains_key(page_id)
            || state.s_holders.get(page_id).map_or(false, |s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_locks_are_compatible() {
        let table = LockTable::new();
        let page = PageId::new(1, 0);
        let t1 = TransactionId::new();
        let t2 = TransactionId::new();
        table.acquire_lock(t1, &page, Permission::ReadOnly).unwrap();
        table.acquire_lock(t2, &page, Permission::ReadOnly).unwrap();
        assert!(table.holds_lock(t1, &page));
        assert!(table.holds_lock(t2, &page));
    }

    #[test]
    fn exclusive_excludes_others() {
        let table = LockTable::new();
        let page = PageId::new(1, 0);
        let t1 = TransactionId::new();
        table.acquire_lock(t1, &page, Permission::ReadWrite).unwrap();
        assert!(table.holds_lock(t1, &page));
        assert!(!table.is_page_locked_by_nobody(&page));
    }

    trait TestHelpers {
        fn is_page_locked_by_nobody(&self, page_id: &PageId) -> bool;
    }

    impl TestHelpers for LockTable {
        fn is_page_locked_by_nobody(&self, page_id: &PageId) -> bool {
            !self.is_page_locked(page_id)
        }
    }

    #[test]
    fn upgrade_from_shared_to_exclusive_when_sole_holder() {
        let table = LockTable::new();
        let page = PageId::new(1, 0);
        let t1 = TransactionId::new();
        table.acquire_lock(t1, &page, Permission::ReadOnly).unwrap();
        table.acquire_lock(t1, &page, Permission::ReadWrite).unwrap();
        assert!(table.holds_lock(t1, &page));
    }

    #[test]
    fn release_all_frees_every_page() {
        let table = LockTable::new();
        let p1 = PageId::new(1, 0);
        let p2 = PageId::new(1, 1);
        let t1 = TransactionId::new();
        table.acquire_lock(t1, &p1, Permission::ReadWrite).unwrap();
        table.acquire_lock(t1, &p2, Permission::ReadOnly).unwrap();
        let released = table.release_all(t1);
        assert_eq!(released.len(), 2);
        assert!(!table.holds_lock(t1, &p1));
        assert!(!table.holds_lock(t1, &p2));
    }

    #[test]
    fn deadlock_between_two_transactions_aborts_requester() {
        use std::sync::Arc;
        use std::thread;
        use std::time::Duration;

        let table = Arc::new(LockTable::new());
        let p1 = PageId::new(1, 0);
        let p2 = PageId::new(1, 1);
        let t1 = TransactionId::new();
        let t2 = TransactionId::new();

        table.acquire_lock(t1, &p1, Permission::ReadWrite).unwrap();
        table.acquire_lock(t2, &p2, Permission::ReadWrite).unwrap();

        let table2 = Arc::clone(&table);
        let h = thread::spawn(move || {
            // t2 waits on p1, held by t1.
            table2.acquire_lock(t2, &p1, Permission::ReadWrite)
        });

        thread::sleep(Duration::from_millis(50));

        // t1 now waits on p2, held by t2: this closes the cycle, so
        // t1 (the requester) must abort.
        let result = table.acquire_lock(t1, &p2, Permission::ReadWrite);
        assert!(result.is_err());
        assert!(result.unwrap_err().is_aborted());

        table.release_all(t1);
        assert!(h.join().unwrap().is_ok());
    }
}
