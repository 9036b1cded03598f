//! End-to-end tests of `BufferManager` against a real `HeapFile`-backed
//! page store: shared-read concurrency, writer-blocks-reader, force-at-
//! commit, abort rollback, and no-steal eviction. Each test builds its
//! own `BufferManager`/`HeapFile` pair so tests never share locks or
//! cache state with each other.

mod common;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use txdb::{
    buffer::{BufferManager, PageStore},
    config,
    permission::Permission,
    transaction_id::TransactionId,
};

use common::{allocate_pages, page_of, temp_heap_file, FailingWriteStore};

/// S1: two transactions reading the same page concurrently both
/// succeed and see the same bytes; neither has to wait on the other.
#[test]
fn shared_concurrency_does_not_block() {
    let file = temp_heap_file();
    let pages = allocate_pages(&file, 1);
    let bm = BufferManager::new(10);
    let t1 = TransactionId::new();
    let t2 = TransactionId::new();

    let p1 = bm.get_page(t1, &pages[0], Permission::ReadOnly, &file).unwrap();
    let p2 = bm.get_page(t2, &pages[0], Permission::ReadOnly, &file).unwrap();

    assert_eq!(p1.read().unwrap().bytes, p2.read().unwrap().bytes);
    assert!(bm.holds_lock(t1, &pages[0]));
    assert!(bm.holds_lock(t2, &pages[0]));
}

/// S2: a writer's exclusive lock blocks a concurrent reader until the
/// writer commits, at which point the reader observes the writer's
/// bytes.
#[test]
fn writer_blocks_reader_until_commit() {
    let file = Arc::new(temp_heap_file());
    let pages = allocate_pages(&file, 1);
    let page_id = pages[0];
    let bm = Arc::new(BufferManager::new(10));
    let t1 = TransactionId::new();
    let t2 = TransactionId::new();

    let page = bm.get_page(t1, &page_id, Permission::ReadWrite, &*file).unwrap();
    page.write().unwrap().bytes = page_of(7);

    let bm2 = Arc::clone(&bm);
    let file2 = Arc::clone(&file);
    let reader = thread::spawn(move || {
        let start = Instant::now();
        let page = bm2.get_page(t2, &page_id, Permission::ReadOnly, &*file2).unwrap();
        (start.elapsed(), page.read().unwrap().bytes.clone())
    });

    // give the reader thread time to block on T1's exclusive lock.
    thread::sleep(Duration::from_millis(100));
    bm.complete_transaction(t1, true, &*file).unwrap();

    let (elapsed, bytes) = reader.join().unwrap();
    assert!(elapsed >= Duration::from_millis(80));
    assert_eq!(bytes, page_of(7));
}

/// S4 (force-at-commit, invariant 4): once `complete_transaction`
/// commits, the dirtied bytes are on disk, readable independent of the
/// cache.
#[test]
fn commit_forces_dirty_pages_to_disk() {
    let file = temp_heap_file();
    let pages = allocate_pages(&file, 1);
    let bm = BufferManager::new(10);
    let t1 = TransactionId::new();

    let page = bm.get_page(t1, &pages[0], Permission::ReadWrite, &file).unwrap();
    page.write().unwrap().bytes = page_of(9);
    bm.mark_dirty(t1, &pages[0]);
    bm.complete_transaction(t1, true, &file).unwrap();

    assert_eq!(file.read_page(&pages[0]).unwrap(), page_of(9));
    assert!(!bm.holds_lock(t1, &pages[0]));
}

/// S6 (abort rollback, invariant 5): an aborted transaction's dirty
/// pages read back as whatever was there before its first write, both
/// from the cache and from disk.
#[test]
fn abort_restores_previous_bytes() {
    let file = temp_heap_file();
    let pages = allocate_pages(&file, 1);
    let bm = BufferManager::new(10);
    let t1 = TransactionId::new();
    let t2 = TransactionId::new();

    let page = bm.get_page(t1, &pages[0], Permission::ReadWrite, &file).unwrap();
    page.write().unwrap().bytes = page_of(3);
    bm.mark_dirty(t1, &pages[0]);
    bm.complete_transaction(t1, false, &file).unwrap();

    // the page was never flushed, so disk still holds the original
    // all-zero bytes `allocate_page` wrote.
    assert_eq!(file.read_page(&pages[0]).unwrap(), page_of(0));

    let reread = bm.get_page(t2, &pages[0], Permission::ReadOnly, &file).unwrap();
    assert_eq!(reread.read().unwrap().bytes, page_of(0));
}

/// S5 (no-steal, invariants 3 and 7): a full cache of dirty, locked
/// pages has no eviction victim; once the dirtying transaction commits
/// (clearing both the dirty bit and the lock), eviction can proceed.
#[test]
fn eviction_respects_dirty_and_locked_pages() {
    let file = temp_heap_file();
    let pages = allocate_pages(&file, 4);
    let bm = BufferManager::new(3);
    let t1 = TransactionId::new();

    for page_id in &pages[..3] {
        let page = bm.get_page(t1, page_id, Permission::ReadWrite, &file).unwrap();
        page.write().unwrap().bytes = page_of(1);
        bm.mark_dirty(t1, page_id);
    }

    let err = bm.get_page(t1, &pages[3], Permission::ReadOnly, &file).unwrap_err();
    assert!(!err.is_aborted());

    bm.complete_transaction(t1, true, &file).unwrap();

    // locks are released and the three pages are now clean, so a
    // fourth page can be brought in by evicting one of them.
    assert!(bm.get_page(t1, &pages[3], Permission::ReadOnly, &file).is_ok());
}

/// spec.md §7: an I/O failure while flushing a dirtied page at commit
/// must still surface as an error to the caller, but locks are freed
/// regardless — otherwise every other transaction waiting on those
/// pages blocks forever, since the system has no lock timeout.
#[test]
fn commit_releases_locks_even_when_flush_fails() {
    let file = temp_heap_file();
    let pages = allocate_pages(&file, 1);
    let store = FailingWriteStore(file);
    let bm = BufferManager::new(10);
    let t1 = TransactionId::new();

    let page = bm.get_page(t1, &pages[0], Permission::ReadWrite, &store).unwrap();
    page.write().unwrap().bytes = page_of(5);
    bm.mark_dirty(t1, &pages[0]);

    let result = bm.complete_transaction(t1, true, &store);
    assert!(result.is_err());
    assert!(!bm.holds_lock(t1, &pages[0]));
}

/// Invariant 7: the cache never holds more pages than its capacity.
#[test]
fn cache_residency_is_bounded() {
    let file = temp_heap_file();
    let pages = allocate_pages(&file, 5);
    let bm = BufferManager::new(2);
    let t1 = TransactionId::new();

    for page_id in &pages {
        bm.get_page(t1, page_id, Permission::ReadOnly, &file).unwrap();
        bm.unsafe_release(t1, page_id);
    }
    // nothing to assert on cache size directly (it is private to the
    // manager), but every request above must have succeeded without
    // ResourceExhausted despite 5 pages through a 2-page cache, which
    // is only possible if eviction kept it within capacity throughout.
}

/// spec.md §6: `page_size`/`capacity` are settable for tests only, to
/// exercise eviction with far fewer pages than the 4096-byte/50-page
/// defaults allow. Both are reset back to their defaults afterwards so
/// later tests in this binary see the process-wide defaults again.
#[test]
fn shrunk_page_size_and_capacity_still_evict_correctly() {
    config::set_page_size(128);
    config::set_buffer_pool_pages(2);

    let file = temp_heap_file();
    let pages = allocate_pages(&file, 4);
    let bm = BufferManager::new(config::buffer_pool_pages());
    let t1 = TransactionId::new();

    for page_id in &pages {
        let page = bm.get_page(t1, page_id, Permission::ReadOnly, &file).unwrap();
        assert_eq!(page.read().unwrap().bytes.len(), config::page_size());
        bm.unsafe_release(t1, page_id);
    }

    config::reset_page_size_for_test();
    config::reset_buffer_pool_pages_for_test();
}
