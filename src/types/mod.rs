//! All data types for the quick-block library.

pub mod config;
pub mod error;
pub mod user;

pub use config::{BlockMode, ButtonVisibility, Config, Timings};
pub use error::{BlockError, BlockResult};
pub use user::{canonicalize, BlockedUser};

/// Storage key of the persisted block list.
pub const BLOCKED_USERS_KEY: &str = "blockedUsers";

/// Storage key of the persisted config record.
pub const CONFIG_KEY: &str = "config";

/// Version string written into export files.
pub const EXPORT_VERSION: &str = "1.0";

/// Returns the current wall-clock time.
pub fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}
