//! `SequentialScan` over an empty table must never touch the lock
//! table: a phantom `READ_ONLY` grant on a page that doesn't exist yet
//! would otherwise block a concurrent `INSERT`'s first write to that
//! same table.

mod common;

use std::sync::Arc;

use txdb::{
    buffer::BufferManager,
    cell::Cell,
    operators::{dml::Insert, scan::SequentialScan},
    page_id::PageId,
    transaction_id::TransactionId,
};

use common::temp_heap_table;

#[test]
fn scanning_an_empty_table_acquires_no_locks() {
    let table = temp_heap_table();
    let bm = BufferManager::new(10);
    let reader = TransactionId::new();

    let scan = SequentialScan::new(reader, &bm, Arc::clone(&table));
    let rows: Vec<_> = scan.collect();
    assert!(rows.is_empty());

    // page 0 doesn't exist on disk yet, so a scan over an empty table
    // must not have acquired a lock on it.
    let phantom_page = PageId::new(table.read().unwrap().table_id, 0);
    assert!(!bm.holds_lock(reader, &phantom_page));
}

#[test]
fn insert_into_empty_table_does_not_block_behind_a_prior_empty_scan() {
    let table = temp_heap_table();
    let bm = BufferManager::new(10);
    let scanner = TransactionId::new();
    let writer = TransactionId::new();

    // scanner's transaction never completes here — if `SequentialScan`
    // had grabbed a lock on page 0 while the table was still empty,
    // this would deadlock/hang the test instead of returning.
    let scan = SequentialScan::new(scanner, &bm, Arc::clone(&table));
    assert_eq!(scan.count(), 0);

    let inserter = Insert::new(writer, &bm, Arc::clone(&table));
    inserter.insert(vec![Cell::Int64(42)]).unwrap();

    let guard = table.read().unwrap();
    bm.complete_transaction(writer, true, guard.file()).unwrap();
}
