//! Persisted key-value storage shared by every execution context.
//!
//! Access is asynchronous and yields to the scheduler, so any state read
//! before an `.await` may be stale after it. Writers replace whole values;
//! there is no compare-and-swap, and concurrent writers from two contexts
//! race with last-write-wins.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::types::{BlockResult, BlockedUser, Config, BLOCKED_USERS_KEY, CONFIG_KEY};

/// Storage area a change notification belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageArea {
    Local,
    Sync,
}

/// Notification that one or more keys were written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub area: StorageArea,
    pub keys: Vec<String>,
}

impl StoreChange {
    /// Whether `key` changed in the local area.
    pub fn touches_local(&self, key: &str) -> bool {
        self.area == StorageArea::Local && self.keys.iter().any(|k| k == key)
    }
}

/// Asynchronous key-value store with change notification.
#[async_trait(?Send)]
pub trait PersistedStore {
    /// Read one key. Missing keys read as `None`.
    async fn get(&self, key: &str) -> BlockResult<Option<Value>>;

    /// Replace the value of one key and notify every subscriber.
    async fn set(&self, key: &str, value: Value) -> BlockResult<()>;

    /// Delete one key and notify every subscriber.
    async fn remove(&self, key: &str) -> BlockResult<()>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// Capacity of change-notification channels.
pub(crate) const CHANGE_CAPACITY: usize = 64;

/// Read the persisted block list. A missing key reads as empty.
pub async fn load_blocked_users(store: &dyn PersistedStore) -> BlockResult<Vec<BlockedUser>> {
    match store.get(BLOCKED_USERS_KEY).await? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(Vec::new()),
    }
}

/// Replace the persisted block list wholesale.
pub async fn save_blocked_users(store: &dyn PersistedStore, users: &[BlockedUser]) -> BlockResult<()> {
    store
        .set(BLOCKED_USERS_KEY, serde_json::to_value(users)?)
        .await
}

/// Read the persisted config, merged over the defaults.
pub async fn load_config(store: &dyn PersistedStore) -> BlockResult<Config> {
    match store.get(CONFIG_KEY).await? {
        Some(Value::Null) | None => Ok(Config::default()),
        Some(value) => Ok(serde_json::from_value(value)?),
    }
}

/// Write the config record.
pub async fn save_config(store: &dyn PersistedStore, config: &Config) -> BlockResult<()> {
    store.set(CONFIG_KEY, serde_json::to_value(config)?).await
}
