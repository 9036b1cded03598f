//! Waits-for graph over transaction ids, used by [`super::lock_table::LockTable`]
//! to detect deadlocks before a requester blocks. Grounded on
//! `transaction/wait_for_graph.rs` near-verbatim.

use std::collections::{HashMap, HashSet};

use crate::transaction_id::TransactionId;

pub struct WaitForGraph {
    graph: HashMap<TransactionId, HashSet<TransactionId>>,
}

impl WaitForGraph {
    pub fn new() -> Self {
        Self {
            graph: HashMap::new(),
        }
    }

    pub fn add_edge(&mut self, from: TransactionId, to: TransactionId) {
        self.graph.entry(from).or_insert_with(HashSet::new).insert(to);
    }

    pub fn remove_edge(&mut self, from: TransactionId, to: TransactionId) {
        if let Some(waiting_for) = self.graph.get_mut(&from) {
            waiting_for.remove(&to);
        }
    }

    /// Replace `from`'s entire adjacency set with `to`, rather than
    /// adding to it. Re-waiting overwrites the prior set instead of
    /// accumulating stale edges from earlier wait iterations (an empty
    /// `to` clears `from`'s outgoing edges entirely).
    pub fn set_edges(&mut self, from: TransactionId, to: HashSet<TransactionId>) {
        if to.is_empty() {
            self.graph.remove(&from);
        } else {
            self.graph.insert(from, to);
        }
    }

    pub fn remove_transaction(&mut self, tid: TransactionId) {
        self.graph.remove(&tid);
        for waiting_for in self.graph.values_mut() {
            waiting_for.remove(&tid);
        }
    }

    /// True if adding an edge `from -> to` would close a cycle
    /// reachable back to `from`, i.e. `from` would deadlock.
    pub fn creates_cycle(&self, from: TransactionId, to: TransactionId) -> bool {
        if from == to {
            return true;
        }
        let mut visited = HashSet::new();
        self.reaches(to, from, &mut visited)
    }

    fn reaches(
        &self,
        current: TransactionId,
        target: TransactionId,
        visited: &mut HashSet<TransactionId>,
    ) -> bool {
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            return false;
        }
        if let Some(waiting_for) = self.graph.get(&current) {
            for &next in waiting_for {
                if self.reaches(next, target, visited) {
                    return true;
                }
            }
        }
        false
    }
}
