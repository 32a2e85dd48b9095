//! JSON-file store used by the command-line control panel.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use super::{PersistedStore, StorageArea, StoreChange, CHANGE_CAPACITY};
use crate::types::BlockResult;

/// Keeps every key in one JSON object on disk. Each write rewrites the whole
/// file. Change notifications reach subscribers in this process only.
pub struct FileStore {
    path: PathBuf,
    changes: broadcast::Sender<StoreChange>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            path: path.into(),
            changes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BlockResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let text = std::fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn write_all(&self, values: &Map<String, Value>) -> BlockResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(values)?)?;
        Ok(())
    }

    fn publish(&self, key: &str) {
        let _ = self.changes.send(StoreChange {
            area: StorageArea::Local,
            keys: vec![key.to_string()],
        });
    }
}

#[async_trait(?Send)]
impl PersistedStore for FileStore {
    async fn get(&self, key: &str) -> BlockResult<Option<Value>> {
        Ok(self.read_all()?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> BlockResult<()> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value);
        self.write_all(&values)?;
        log::debug!("Wrote {} to {}", key, self.path.display());
        self.publish(key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> BlockResult<()> {
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
            self.publish(key);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}
