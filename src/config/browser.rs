//! Headless browser configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Headless browser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Run Chrome without a window
    #[serde(default = "default_true")]
    pub headless: bool,
    /// Chrome/Chromium binary (auto-detected when unset)
    #[serde(default)]
    pub executable: Option<PathBuf>,
    /// Navigation and script timeout in seconds
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_navigation_timeout() -> u64 {
    30
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            navigation_timeout_secs: 30,
        }
    }
}
