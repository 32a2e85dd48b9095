//! Block list export files and the import merge.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{BlockError, BlockResult, BlockedUser, EXPORT_VERSION};

/// On-disk export format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub blocked_users: Vec<BlockedUser>,
}

impl ExportFile {
    pub fn new(blocked_users: Vec<BlockedUser>, exported_at: DateTime<Utc>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            exported_at,
            blocked_users,
        }
    }

    pub fn to_json(&self, pretty: bool) -> BlockResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

/// Suggested file name for an export made at `now`.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("twitter-blocklist-{}.json", now.format("%Y-%m-%d"))
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Records appended to the block list.
    pub accepted: usize,
    /// Records dropped because their username was already present.
    pub skipped: usize,
}

/// Shape-check an import payload and return its records.
///
/// Only `blockedUsers` is required; `version` and `exportedAt` are
/// informational. Any malformed record rejects the whole payload.
pub fn parse_import(text: &str) -> BlockResult<Vec<BlockedUser>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| BlockError::InvalidImport(format!("not valid JSON: {e}")))?;
    let entries = value
        .get("blockedUsers")
        .and_then(Value::as_array)
        .ok_or_else(|| BlockError::InvalidImport("missing blockedUsers array".to_string()))?;

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            serde_json::from_value(entry.clone())
                .map_err(|e| BlockError::InvalidImport(format!("entry {i}: {e}")))
        })
        .collect()
}

/// Append `incoming` to `existing`, dropping records whose canonical username
/// is already present (including repeats within `incoming`). Existing
/// records are never overwritten.
pub fn merge_additive(existing: &mut Vec<BlockedUser>, incoming: Vec<BlockedUser>) -> ImportReport {
    let mut seen: HashSet<String> = existing
        .iter()
        .map(|u| u.canonical_username.clone())
        .collect();
    let mut report = ImportReport::default();
    for user in incoming {
        if seen.insert(user.canonical_username.clone()) {
            existing.push(user);
            report.accepted += 1;
        } else {
            report.skipped += 1;
        }
    }
    report
}
