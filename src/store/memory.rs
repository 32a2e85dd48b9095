//! In-process store shared between contexts of one process.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use super::{PersistedStore, StorageArea, StoreChange, CHANGE_CAPACITY};
use crate::types::{BlockError, BlockResult};

struct Inner {
    values: RefCell<HashMap<String, Value>>,
    changes: broadcast::Sender<StoreChange>,
    writes: Cell<u64>,
    fail_writes: Cell<bool>,
}

/// Shared in-memory store. Clones share the same storage, so each clone
/// stands in for one execution context's handle.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Rc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            inner: Rc::new(Inner {
                values: RefCell::new(HashMap::new()),
                changes,
                writes: Cell::new(0),
                fail_writes: Cell::new(false),
            }),
        }
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> u64 {
        self.inner.writes.get()
    }

    /// Make every following write fail, to exercise error propagation.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.set(fail);
    }

    /// Synchronous peek, bypassing the scheduler.
    pub fn snapshot(&self, key: &str) -> Option<Value> {
        self.inner.values.borrow().get(key).cloned()
    }

    fn publish(&self, key: &str) {
        // No receivers is fine: nobody is listening yet.
        let _ = self.inner.changes.send(StoreChange {
            area: StorageArea::Local,
            keys: vec![key.to_string()],
        });
    }

    fn check_writable(&self) -> BlockResult<()> {
        if self.inner.fail_writes.get() {
            return Err(BlockError::Store("write rejected".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl PersistedStore for MemoryStore {
    async fn get(&self, key: &str) -> BlockResult<Option<Value>> {
        tokio::task::yield_now().await;
        Ok(self.snapshot(key))
    }

    async fn set(&self, key: &str, value: Value) -> BlockResult<()> {
        tokio::task::yield_now().await;
        self.check_writable()?;
        self.inner
            .values
            .borrow_mut()
            .insert(key.to_string(), value);
        self.inner.writes.set(self.inner.writes.get() + 1);
        self.publish(key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> BlockResult<()> {
        tokio::task::yield_now().await;
        self.check_writable()?;
        self.inner.values.borrow_mut().remove(key);
        self.inner.writes.set(self.inner.writes.get() + 1);
        self.publish(key);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.inner.changes.subscribe()
    }
}
