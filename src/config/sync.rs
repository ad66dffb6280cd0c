//! Gist mirror configuration

use serde::{Deserialize, Serialize};

/// Gist mirror configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Gist API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Existing gist to update; a new secret gist is created when unset
    #[serde(default)]
    pub gist_id: Option<String>,
    /// File name of the table inside the gist
    #[serde(default = "default_file_name")]
    pub file_name: String,
    /// API token (falls back to the GITHUB_TOKEN environment variable)
    #[serde(default)]
    pub token: Option<String>,
    /// Total attempts per request
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Pause between attempts in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_file_name() -> String {
    "links.csv".to_string()
}

fn default_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    30
}

impl SyncConfig {
    /// Token from config, or from the environment
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            gist_id: None,
            file_name: default_file_name(),
            token: None,
            attempts: default_attempts(),
            retry_delay_ms: default_retry_delay(),
            timeout_secs: default_timeout(),
        }
    }
}
