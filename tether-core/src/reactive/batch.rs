//! Batched Flushes
//!
//! By default each store write synchronizes the document before returning,
//! so N writes cost N synchronization passes. A batch defers those passes:
//! the paths written while it is open are collected, deduplicated, and
//! resolved once when the outermost batch closes.
//!
//! # Implementation
//!
//! The store keeps a depth counter and an ordered set of pending paths.
//! Entering a batch increments the depth; the returned guard decrements it
//! on drop and, when the depth reaches zero, hands the pending paths back to
//! the store for resolution. Dropping the guard flushes even if the batch
//! body panicked, so the document never stays behind the tree.

use indexmap::IndexSet;

use super::path::Path;
use super::store::Store;

/// Batch bookkeeping held by a store.
#[derive(Debug, Default)]
pub(crate) struct BatchState {
    /// Number of open batches.
    depth: usize,

    /// Paths awaiting resolution, in first-write order.
    pending: IndexSet<Path>,
}

impl BatchState {
    pub(crate) fn enter(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn is_active(&self) -> bool {
        self.depth > 0
    }

    pub(crate) fn defer(&mut self, paths: impl IntoIterator<Item = Path>) {
        self.pending.extend(paths);
    }

    /// Close one batch level. Returns the paths to flush when the outermost
    /// batch closes, and nothing otherwise.
    pub(crate) fn exit(&mut self) -> Vec<Path> {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            std::mem::take(&mut self.pending).into_iter().collect()
        } else {
            Vec::new()
        }
    }
}

/// Guard that closes a batch when dropped.
pub struct BatchGuard<'a> {
    store: &'a Store,
}

impl<'a> BatchGuard<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.store.finish_batch();
    }
}
