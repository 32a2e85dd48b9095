//! The document: element allocation, child-list mutation, and observers.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::element::{attach, Element, NodeId};

/// One child-list change, delivered to observers of the document.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    /// Element whose children changed.
    pub target: Element,
    pub added: Vec<Element>,
    pub removed: Vec<Element>,
}

struct DocumentInner {
    body: Element,
    next_id: Cell<NodeId>,
    observers: RefCell<Vec<UnboundedSender<MutationRecord>>>,
}

/// A live element tree rooted at `body`.
///
/// Only child-list changes under a connected parent are reported, matching a
/// subtree observation of `body`. Attribute and class changes are silent.
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(DocumentInner {
                body: Element::new(0, "body", true),
                next_id: Cell::new(1),
                observers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn body(&self) -> Element {
        self.inner.body.clone()
    }

    /// Allocate a detached element.
    pub fn create_element(&self, tag: &str) -> Element {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        Element::new(id, tag, false)
    }

    /// Insert `child` as the last child of `parent`, moving it if it already
    /// has a parent.
    pub fn append_child(&self, parent: &Element, child: &Element) {
        let old_parent = child.parent();
        if let Some(old) = &old_parent {
            if old.is_connected() {
                child.detach();
                self.notify(MutationRecord {
                    target: old.clone(),
                    added: Vec::new(),
                    removed: vec![child.clone()],
                });
            }
        }
        attach(parent, child);
        if parent.is_connected() {
            self.notify(MutationRecord {
                target: parent.clone(),
                added: vec![child.clone()],
                removed: Vec::new(),
            });
        }
    }

    /// Detach an element from its parent. Removing a detached element is a
    /// no-op.
    pub fn remove(&self, el: &Element) {
        let was_connected = el.is_connected();
        if let Some(parent) = el.detach() {
            if was_connected {
                self.notify(MutationRecord {
                    target: parent,
                    added: Vec::new(),
                    removed: vec![el.clone()],
                });
            }
        }
    }

    /// All connected elements matching a predicate, in document order.
    pub fn query_all(&self, pred: impl Fn(&Element) -> bool) -> Vec<Element> {
        self.inner.body.find_all(pred)
    }

    pub fn query_first(&self, pred: impl Fn(&Element) -> bool) -> Option<Element> {
        self.inner.body.find_first(pred)
    }

    /// Subscribe to child-list mutations. Dropping the receiver disconnects
    /// the observer on the next delivery.
    pub fn observe(&self) -> UnboundedReceiver<MutationRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.observers.borrow_mut().push(tx);
        rx
    }

    /// Number of attached observers.
    pub fn observer_count(&self) -> usize {
        self.inner
            .observers
            .borrow()
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn notify(&self, record: MutationRecord) {
        self.inner
            .observers
            .borrow_mut()
            .retain(|tx| tx.send(record.clone()).is_ok());
    }
}

/// A document handle that does not keep the document alive.
#[derive(Clone)]
pub struct WeakDocument {
    inner: Weak<DocumentInner>,
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.inner.upgrade().map(|inner| Document { inner })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
