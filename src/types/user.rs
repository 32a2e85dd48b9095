//! The persisted block record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::BlockMode;

/// Normalize a handle into its canonical (lookup) form.
///
/// Leading whitespace and a single leading `@` are dropped, the rest is
/// lowercased. Canonical usernames are the unique key of the block list.
pub fn canonicalize(name: &str) -> String {
    let trimmed = name.trim();
    trimmed
        .strip_prefix('@')
        .unwrap_or(trimmed)
        .to_lowercase()
}

/// One entry of the persisted block list.
///
/// Records are created by a block action or an import, deleted by unblock
/// or clear-all, and never mutated in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawBlockedUser")]
pub struct BlockedUser {
    /// Lowercase handle, unique within the list.
    pub canonical_username: String,
    /// Handle as it was rendered when the block happened.
    pub display_username: String,
    /// Best-effort stable identity; falls back to the canonical username.
    pub identity_hint: String,
    /// When the block happened.
    pub blocked_at: DateTime<Utc>,
    /// Block mode active when the record was created.
    pub method: BlockMode,
}

impl BlockedUser {
    /// Create a record stamped with the current time.
    pub fn new(display_username: &str, identity_hint: Option<&str>, method: BlockMode) -> Self {
        Self::at(display_username, identity_hint, method, super::now())
    }

    /// Create a record with an explicit timestamp.
    pub fn at(
        display_username: &str,
        identity_hint: Option<&str>,
        method: BlockMode,
        blocked_at: DateTime<Utc>,
    ) -> Self {
        let canonical_username = canonicalize(display_username);
        let identity_hint = identity_hint
            .map(str::trim)
            .filter(|hint| !hint.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| canonical_username.clone());
        Self {
            canonical_username,
            display_username: display_username.trim().to_string(),
            identity_hint,
            blocked_at,
            method,
        }
    }

    /// Whether this record blocks the given handle (case-insensitive).
    pub fn matches(&self, name: &str) -> bool {
        self.canonical_username == canonicalize(name)
    }
}

/// Wire shape accepted on read. Older lists and exports only carry
/// `username`/`userId`, so both spellings are accepted.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlockedUser {
    canonical_username: Option<String>,
    #[serde(alias = "username")]
    display_username: Option<String>,
    #[serde(alias = "userId")]
    identity_hint: Option<String>,
    blocked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    method: BlockMode,
}

impl TryFrom<RawBlockedUser> for BlockedUser {
    type Error = String;

    fn try_from(raw: RawBlockedUser) -> Result<Self, Self::Error> {
        let display = raw
            .display_username
            .or(raw.canonical_username.clone())
            .filter(|name| !canonicalize(name).is_empty())
            .ok_or_else(|| "record is missing a username".to_string())?;

        let mut user = BlockedUser::at(
            &display,
            raw.identity_hint.as_deref(),
            raw.method,
            raw.blocked_at.unwrap_or_default(),
        );
        if let Some(canonical) = raw.canonical_username {
            let canonical = canonicalize(&canonical);
            if !canonical.is_empty() {
                user.canonical_username = canonical;
            }
        }
        Ok(user)
    }
}
