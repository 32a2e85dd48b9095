//! Control panel state: list management, config, import and export.
//!
//! This is the second consumer of the persisted keys. It keeps a local copy
//! of the list, replaces the stored list wholesale on every edit, and is
//! expected to [`reload`](ControlPanel::reload) whenever a change
//! notification for the list arrives, even in the middle of an edit.

pub mod transfer;

pub use transfer::{export_file_name, merge_additive, parse_import, ExportFile, ImportReport};

use std::rc::Rc;

use chrono::{DateTime, Datelike, Utc};

use crate::store::{load_blocked_users, load_config, save_blocked_users, save_config, PersistedStore};
use crate::types::{canonicalize, BlockMode, BlockResult, BlockedUser, Config};

/// Rough number of items assumed visible per blocked author.
pub const ITEMS_PER_USER_ESTIMATE: usize = 10;

/// Summary figures shown above the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelStats {
    pub blocked: usize,
    pub hidden_estimate: usize,
}

/// Control panel over a persisted store.
pub struct ControlPanel {
    store: Rc<dyn PersistedStore>,
    users: Vec<BlockedUser>,
    config: Config,
}

impl ControlPanel {
    /// Read both keys from the store.
    pub async fn load(store: Rc<dyn PersistedStore>) -> BlockResult<Self> {
        let mut panel = Self {
            store,
            users: Vec::new(),
            config: Config::default(),
        };
        panel.reload().await?;
        Ok(panel)
    }

    /// Re-read the store, most recent block first.
    pub async fn reload(&mut self) -> BlockResult<()> {
        let mut users = load_blocked_users(self.store.as_ref()).await?;
        users.sort_by(|a, b| b.blocked_at.cmp(&a.blocked_at));
        self.users = users;
        self.config = load_config(self.store.as_ref()).await?;
        Ok(())
    }

    pub fn users(&self) -> &[BlockedUser] {
        &self.users
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// Records whose username contains `query`, case-insensitively. An empty
    /// query matches everything.
    pub fn filtered(&self, query: &str) -> Vec<&BlockedUser> {
        let query = query.trim().to_lowercase();
        self.users
            .iter()
            .filter(|u| query.is_empty() || u.display_username.to_lowercase().contains(&query))
            .collect()
    }

    pub fn stats(&self) -> PanelStats {
        PanelStats {
            blocked: self.users.len(),
            hidden_estimate: self.users.len() * ITEMS_PER_USER_ESTIMATE,
        }
    }

    /// Add a record by hand. Returns `false` if the user is already blocked.
    pub async fn block(&mut self, name: &str, identity_hint: Option<&str>) -> BlockResult<bool> {
        if self.users.iter().any(|u| u.matches(name)) {
            return Ok(false);
        }
        let record = BlockedUser::new(name, identity_hint, self.config.block_mode);
        self.users.insert(0, record);
        self.save().await?;
        log::info!("Blocked @{} from the panel", canonicalize(name));
        Ok(true)
    }

    /// Remove a user. Returns `false` if no record matched.
    pub async fn unblock(&mut self, name: &str) -> BlockResult<bool> {
        let before = self.users.len();
        self.users.retain(|u| !u.matches(name));
        if self.users.len() == before {
            return Ok(false);
        }
        self.save().await?;
        log::info!("Unblocked @{} from the panel", canonicalize(name));
        Ok(true)
    }

    /// Unblock everyone. Returns how many records were removed.
    pub async fn clear_all(&mut self) -> BlockResult<usize> {
        let removed = self.users.len();
        self.users.clear();
        self.save().await?;
        log::info!("Cleared {removed} blocked users");
        Ok(removed)
    }

    /// Persist a config change immediately. Page contexts pick it up on
    /// their next start.
    pub async fn set_config(&mut self, config: Config) -> BlockResult<()> {
        self.config = config;
        save_config(self.store.as_ref(), &config).await
    }

    pub async fn set_block_mode(&mut self, mode: BlockMode) -> BlockResult<()> {
        let config = Config {
            block_mode: mode,
            ..self.config
        };
        self.set_config(config).await
    }

    pub fn export(&self, now: DateTime<Utc>) -> ExportFile {
        ExportFile::new(self.users.clone(), now)
    }

    /// Merge an export file into the list. A malformed payload aborts before
    /// anything is written; a payload with nothing new writes nothing.
    pub async fn import(&mut self, text: &str) -> BlockResult<ImportReport> {
        let incoming = parse_import(text)?;
        let mut merged = self.users.clone();
        let report = merge_additive(&mut merged, incoming);
        if report.accepted == 0 {
            return Ok(report);
        }
        save_blocked_users(self.store.as_ref(), &merged).await?;
        self.users = merged;
        log::info!(
            "Imported {} blocked users ({} already present)",
            report.accepted,
            report.skipped
        );
        Ok(report)
    }

    async fn save(&self) -> BlockResult<()> {
        save_blocked_users(self.store.as_ref(), &self.users).await
    }
}

/// Short human-readable age of a block, as shown in the list.
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(then);
    let minutes = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    if hours < 24 {
        return format!("{hours}h ago");
    }
    if days < 7 {
        return format!("{days}d ago");
    }
    if then.year() != now.year() {
        then.format("%b %-d, %Y").to_string()
    } else {
        then.format("%b %-d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn relative_time_buckets() {
        let now = at("2024-06-15T12:00:00Z");
        assert_eq!(format_relative(now, now), "Just now");
        assert_eq!(format_relative(now + Duration::minutes(5), now), "Just now");
        assert_eq!(format_relative(now - Duration::minutes(59), now), "59m ago");
        assert_eq!(format_relative(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_relative(now - Duration::days(6), now), "6d ago");
        assert_eq!(format_relative(at("2024-06-01T08:00:00Z"), now), "Jun 1");
        assert_eq!(format_relative(at("2023-12-24T08:00:00Z"), now), "Dec 24, 2023");
    }
}
