//! Initial synchronization.
//!
//! Walks the whole state tree once and resolves every leaf path against the
//! whole document, so the page shows the store's state before anything is
//! written. Run it after the markup and the store are both in place.

use tracing::debug;

use crate::reactive::{Path, Store};

/// Resolve every leaf path of the store's tree. Returns the number of
/// element writes performed.
///
/// Calling this again with an unchanged tree rewrites the same values and
/// leaves the document as it was.
pub fn init(store: &Store) -> usize {
    let leaves = store.with_tree(|tree| tree.leaf_paths(&Path::root()));
    let written: usize = leaves
        .iter()
        .map(|path| store.resolve(path, None))
        .sum();
    debug!(paths = leaves.len(), written, "initial synchronization");
    written
}
