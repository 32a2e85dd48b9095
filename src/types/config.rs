//! User-facing config record and engine timings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{BlockError, BlockResult};

/// What a block action does to the author's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockMode {
    /// Hide the author's content on the page.
    #[default]
    Hide,
    /// Also request a native block from the host. Content is hidden either way.
    Native,
}

impl BlockMode {
    /// Return the stored name of this mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hide => "hide",
            Self::Native => "native",
        }
    }

    /// Parse a mode from its stored name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "hide" => Some(Self::Hide),
            "native" => Some(Self::Native),
            _ => None,
        }
    }
}

/// When the injected block control is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVisibility {
    /// Only while the pointer is over the content node.
    #[default]
    Hover,
    /// Permanently.
    Always,
}

impl ButtonVisibility {
    /// Return the stored name of this setting.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hover => "hover",
            Self::Always => "always",
        }
    }

    /// Parse a setting from its stored name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "hover" => Some(Self::Hover),
            "always" => Some(Self::Always),
            _ => None,
        }
    }
}

/// Persisted user config. Read once per context at init.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub block_mode: BlockMode,
    pub button_visibility: ButtonVisibility,
}

impl Config {
    /// Apply optional overrides by name, as given on the command line.
    pub fn with_overrides(mut self, mode: Option<&str>, buttons: Option<&str>) -> BlockResult<Self> {
        if let Some(mode) = mode {
            self.block_mode = BlockMode::from_name(mode)
                .ok_or_else(|| BlockError::InvalidArgument(format!("unknown block mode: {mode}")))?;
        }
        if let Some(buttons) = buttons {
            self.button_visibility = ButtonVisibility::from_name(buttons).ok_or_else(|| {
                BlockError::InvalidArgument(format!("unknown button visibility: {buttons}"))
            })?;
        }
        Ok(self)
    }
}

/// Fixed delays used by the page engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Quiet period that coalesces bursts of document mutations.
    pub debounce: Duration,
    /// Length of the animated hide before the node is fully hidden.
    pub hide_transition: Duration,
    /// How long the undo toast stays before fading.
    pub toast_wait: Duration,
    /// Length of the toast fade-out.
    pub toast_fade: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            hide_transition: Duration::from_millis(300),
            toast_wait: Duration::from_millis(5000),
            toast_fade: Duration::from_millis(300),
        }
    }
}
