//! Command-line control panel.

pub mod commands;

use std::path::{Path, PathBuf};

/// Environment variable naming the store file.
pub const STORE_ENV: &str = "QBLOCK_STORE";

/// Resolve the store file path using priority order:
/// 1. Explicit path (CLI arg)
/// 2. QBLOCK_STORE environment variable
/// 3. .qblock/store.json in current directory
/// 4. ~/.qblock.json (global default)
pub fn resolve_store_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Ok(env_path) = std::env::var(STORE_ENV) {
        return PathBuf::from(env_path);
    }

    let cwd_store = PathBuf::from(".qblock/store.json");
    if cwd_store.exists() {
        return cwd_store;
    }

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".qblock.json")
}
