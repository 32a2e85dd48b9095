//! In-memory mirror of the persisted block list.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use tokio::sync::Mutex;

use crate::store::{load_blocked_users, save_blocked_users, PersistedStore};
use crate::types::{canonicalize, BlockResult, BlockedUser};

/// Project a persisted list onto its set of canonical usernames.
pub fn project(users: &[BlockedUser]) -> HashSet<String> {
    users
        .iter()
        .map(|u| canonicalize(&u.canonical_username))
        .collect()
}

/// Answers "is this identity blocked" for one context.
///
/// The set is a cache; the persisted list is authoritative. `add`, `remove`
/// and `reload` are serialized within one registry, and the set changes only
/// after the store accepted the write. Across contexts there is no version
/// check, so a concurrent writer in another context can lose an update.
pub struct BlockRegistry {
    store: Rc<dyn PersistedStore>,
    names: RefCell<HashSet<String>>,
    writes: Mutex<()>,
}

impl BlockRegistry {
    pub fn new(store: Rc<dyn PersistedStore>) -> Self {
        Self {
            store,
            names: RefCell::new(HashSet::new()),
            writes: Mutex::new(()),
        }
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, name: &str) -> bool {
        self.names.borrow().contains(&canonicalize(name))
    }

    pub fn len(&self) -> usize {
        self.names.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.borrow().is_empty()
    }

    /// Sorted copy of the blocked canonical usernames.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.borrow().iter().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Re-read the persisted list and replace the set in one step.
    pub async fn reload(&self) -> BlockResult<()> {
        let _guard = self.writes.lock().await;
        let users = load_blocked_users(self.store.as_ref()).await?;
        let names = project(&users);
        log::debug!("Registry reloaded with {} blocked users", names.len());
        *self.names.borrow_mut() = names;
        Ok(())
    }

    /// Block a user. Returns `false` when the persisted list already held
    /// the username, in which case nothing is written.
    pub async fn add(&self, record: BlockedUser) -> BlockResult<bool> {
        let _guard = self.writes.lock().await;
        let canonical = canonicalize(&record.canonical_username);

        let mut users = load_blocked_users(self.store.as_ref()).await?;
        if users.iter().any(|u| u.matches(&canonical)) {
            self.names.borrow_mut().insert(canonical);
            return Ok(false);
        }
        users.push(record);
        save_blocked_users(self.store.as_ref(), &users).await?;
        self.names.borrow_mut().insert(canonical);
        Ok(true)
    }

    /// Unblock a user. Returns `false` when no persisted record matched.
    pub async fn remove(&self, name: &str) -> BlockResult<bool> {
        let _guard = self.writes.lock().await;
        let canonical = canonicalize(name);

        let users = load_blocked_users(self.store.as_ref()).await?;
        let before = users.len();
        let kept: Vec<BlockedUser> = users.into_iter().filter(|u| !u.matches(&canonical)).collect();
        if kept.len() != before {
            save_blocked_users(self.store.as_ref(), &kept).await?;
        }
        self.names.borrow_mut().remove(&canonical);
        Ok(kept.len() != before)
    }
}
