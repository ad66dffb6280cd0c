//! Configuration for linkledger

mod browser;
mod http;
mod logging;
mod sources;
mod storage;
mod sync;

pub use browser::BrowserSettings;
pub use http::HttpConfig;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use sources::SourceSpec;
pub use storage::StorageConfig;
pub use sync::SyncConfig;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Configuration validation failed:\n  - {}", .0.join("\n  - "))]
    Invalid(Vec<String>),
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Record table
    #[serde(default)]
    pub storage: StorageConfig,
    /// Headless browser
    #[serde(default)]
    pub browser: BrowserSettings,
    /// HTTP API server
    #[serde(default)]
    pub http: HttpConfig,
    /// Gist mirror
    #[serde(default)]
    pub sync: SyncConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Link sources by name, processed in name order
    #[serde(default)]
    pub sources: BTreeMap<String, SourceSpec>,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects every problem so they can all be fixed in one pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        // Storage validation
        if self.storage.table_path.as_os_str().is_empty() {
            errors.push("table_path must not be empty".to_string());
        }

        // Browser validation
        if self.browser.navigation_timeout_secs == 0 {
            errors.push("navigation_timeout_secs must be positive".to_string());
        }

        // HTTP validation
        if self.http.listen_addr.parse::<SocketAddr>().is_err() {
            errors.push(format!(
                "listen_addr '{}' is not a valid socket address",
                self.http.listen_addr
            ));
        }

        // Sync validation
        if self.sync.attempts == 0 {
            errors.push("sync attempts must be positive".to_string());
        }
        if self.sync.timeout_secs == 0 {
            errors.push("sync timeout_secs must be positive".to_string());
        }
        if self.sync.file_name.trim().is_empty() {
            errors.push("sync file_name must not be empty".to_string());
        }
        if url::Url::parse(&self.sync.api_base).is_err() {
            errors.push(format!("sync api_base '{}' is not a valid URL", self.sync.api_base));
        }

        // Source validation
        for (name, source) in &self.sources {
            errors.extend(source.problems(name));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Look up a source by name
    pub fn source(&self, name: &str) -> Option<&SourceSpec> {
        self.sources.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Helper: build a valid config for mutation-based testing
    // ========================================================================

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.sources.insert(
            "jobs".to_string(),
            SourceSpec::new(
                "https://jobs.example/search",
                "Array.from(document.links).map(a => a.href)",
            )
            .with_normalization_params(["searchId"]),
        );
        config
    }

    fn error_text(config: &Config) -> String {
        config.validate().unwrap_err().to_string()
    }

    // ========================================================================
    // Config::validate – happy path
    // ========================================================================

    #[test]
    fn default_config_passes_validation() {
        assert!(Config::default().validate().is_ok());
        assert!(valid_config().validate().is_ok());
    }

    // ========================================================================
    // Config::validate – source errors
    // ========================================================================

    #[test]
    fn validate_rejects_empty_source_url() {
        let mut cfg = valid_config();
        cfg.sources.get_mut("jobs").unwrap().url = String::new();
        assert!(error_text(&cfg).contains("source 'jobs': url must not be empty"));
    }

    #[test]
    fn validate_rejects_malformed_source_url() {
        let mut cfg = valid_config();
        cfg.sources.get_mut("jobs").unwrap().url = "jobs.example/search".to_string();
        assert!(error_text(&cfg).contains("is not a valid http(s) URL"));
    }

    #[test]
    fn validate_rejects_empty_extraction_command() {
        let mut cfg = valid_config();
        cfg.sources.get_mut("jobs").unwrap().extraction_command = "  ".to_string();
        assert!(error_text(&cfg).contains("extraction_command must not be empty"));
    }

    #[test]
    fn validate_rejects_empty_param_names() {
        let mut cfg = valid_config();
        cfg.sources
            .get_mut("jobs")
            .unwrap()
            .normalization_params
            .push(String::new());
        assert!(error_text(&cfg).contains("normalization_params must not contain empty names"));
    }

    #[test]
    fn validate_rejects_empty_source_name() {
        let mut cfg = valid_config();
        let spec = cfg.sources["jobs"].clone();
        cfg.sources.insert(String::new(), spec);
        assert!(error_text(&cfg).contains("source names must not be empty"));
    }

    // ========================================================================
    // Config::validate – ambient settings
    // ========================================================================

    #[test]
    fn validate_rejects_empty_table_path() {
        let mut cfg = valid_config();
        cfg.storage.table_path = PathBuf::from("");
        assert!(error_text(&cfg).contains("table_path must not be empty"));
    }

    #[test]
    fn validate_rejects_bad_listen_addr() {
        let mut cfg = valid_config();
        cfg.http.listen_addr = "localhost".to_string();
        assert!(error_text(&cfg).contains("is not a valid socket address"));
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut cfg = valid_config();
        cfg.sync.attempts = 0;
        assert!(error_text(&cfg).contains("sync attempts must be positive"));
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let mut cfg = valid_config();
        cfg.browser.navigation_timeout_secs = 0;
        cfg.sync.timeout_secs = 0;
        cfg.sources.get_mut("jobs").unwrap().url = String::new();
        let msg = error_text(&cfg);
        assert!(msg.contains("navigation_timeout_secs must be positive"));
        assert!(msg.contains("sync timeout_secs must be positive"));
        assert!(msg.contains("url must not be empty"));
    }

    // ========================================================================
    // Config::load
    // ========================================================================

    #[test]
    fn load_parses_sources_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("linkledger.toml");
        std::fs::write(
            &path,
            r#"
[storage]
table_path = "data/links.csv"

[sources.board]
url = "https://board.example/"
extraction_command = "[...document.querySelectorAll('a')].map(a => a.href)"
normalization_params = ["searchId", "sid"]

[sources.plain]
url = "https://plain.example/"
extraction_command = "[]"
"#,
        )
        .unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.storage.table_path, PathBuf::from("data/links.csv"));
        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(
            cfg.source("board").unwrap().normalization_params,
            vec!["searchId".to_string(), "sid".to_string()]
        );
        assert!(cfg.source("plain").unwrap().normalization_params.is_empty());
        assert_eq!(cfg.http.listen_addr, "127.0.0.1:3000");
        assert_eq!(cfg.sync.attempts, 3);
        assert_eq!(cfg.logging.level, LogLevel::Info);
        // Sources iterate in name order
        let names: Vec<&String> = cfg.sources.keys().collect();
        assert_eq!(names, vec!["board", "plain"]);
    }

    #[test]
    fn load_rejects_source_without_script() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("linkledger.toml");
        std::fs::write(
            &path,
            r#"
[sources.board]
url = "https://board.example/"
"#,
        )
        .unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "unexpected error: {}", err);
    }

    #[test]
    fn load_reports_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Config::load(&tmp.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn log_level_raises_with_verbosity() {
        assert_eq!(LogLevel::Info.raised(0), LogLevel::Info);
        assert_eq!(LogLevel::Info.raised(1), LogLevel::Debug);
        assert_eq!(LogLevel::Info.raised(5), LogLevel::Trace);
        assert_eq!(LogLevel::Error.raised(2), LogLevel::Info);
    }
}
