//! HTTP API configuration

use serde::{Deserialize, Serialize};

/// HTTP API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Listen address for HTTP server (e.g., "127.0.0.1:3000")
    pub listen_addr: String,
    /// Enable CORS (the review UI may be served from another origin)
    #[serde(default)]
    pub cors_enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".to_string(),
            cors_enabled: false,
        }
    }
}
