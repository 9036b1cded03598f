//! Process-wide, runtime-settable configuration. Grounded on
//! `btree/page_cache.rs`'s `PAGE_SIZE: AtomicUsize` /
//! `set_page_size`/`get_page_size` pattern, widened to also cover the
//! buffer pool's page capacity so tests can shrink it to exercise
//! eviction without touching global state through a mutex.

use std::sync::atomic::{AtomicUsize, Ordering};

pub const DEFAULT_PAGE_SIZE: usize = 4096;
pub const DEFAULT_BUFFER_POOL_PAGES: usize = 50;

static PAGE_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_PAGE_SIZE);
static BUFFER_POOL_PAGES: AtomicUsize = AtomicUsize::new(DEFAULT_BUFFER_POOL_PAGES);

pub fn page_size() -> usize {
    PAGE_SIZE.load(Ordering::Relaxed)
}

pub fn set_page_size(size: usize) {
    PAGE_SIZE.store(size, Ordering::Relaxed);
}

/// Test-only: put `page_size` back to [`DEFAULT_PAGE_SIZE`]. Tests
/// that shrink the page size to exercise eviction must call this once
/// they're done, or later tests in the same process see the shrunk
/// size too (the setting is process-wide, not per-test).
pub fn reset_page_size_for_test() {
    PAGE_SIZE.store(DEFAULT_PAGE_SIZE, Ordering::Relaxed);
}

pub fn buffer_pool_pages() -> usize {
    BUFFER_POOL_PAGES.load(Ordering::Relaxed)
}

pub fn set_buffer_pool_pages(pages: usize) {
    BUFFER_POOL_PAGES.store(pages, Ordering::Relaxed);
}

/// Test-only: put `capacity` back to [`DEFAULT_BUFFER_POOL_PAGES`].
pub fn reset_buffer_pool_pages_for_test() {
    BUFFER_POOL_PAGES.store(DEFAULT_BUFFER_POOL_PAGES, Ordering::Relaxed);
}
