//! Processed marker: remembers which content nodes a scan already handled.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::dom::{Element, NodeId, WeakElement};

/// Side table from node identity to a weak handle.
///
/// Entries never keep a node alive. An entry stops counting as soon as its
/// node is dropped or disconnected from the document, and is purged on the
/// next [`sweep`](Self::sweep) or [`forget_subtree`](Self::forget_subtree).
#[derive(Default)]
pub struct ProcessedMarker {
    entries: RefCell<HashMap<NodeId, WeakElement>>,
}

impl ProcessedMarker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `node` was marked and is still live in the document.
    pub fn is_marked(&self, node: &Element) -> bool {
        let marked = self
            .entries
            .borrow()
            .get(&node.id())
            .is_some_and(|weak| weak.is_alive());
        marked && node.is_connected()
    }

    pub fn mark(&self, node: &Element) {
        self.entries.borrow_mut().insert(node.id(), node.downgrade());
    }

    /// Drop the entries of a removed node and everything below it.
    pub fn forget_subtree(&self, root: &Element) {
        let mut entries = self.entries.borrow_mut();
        entries.remove(&root.id());
        for el in root.descendants() {
            entries.remove(&el.id());
        }
    }

    /// Purge entries whose node is gone or no longer in the document.
    /// Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|_, weak| weak.upgrade().is_some_and(|el| el.is_connected()));
        before - entries.len()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
