//! Browser collaborator
//!
//! A `Browser` opens a source page, runs the source's extraction script in it
//! and hands back whatever strings the script produced. The output is
//! untrusted: callers validate and deduplicate it, nothing here interprets it.
//!
//! `ChromeBrowser` drives Chrome/Chromium over the DevTools protocol. A fresh
//! browser process is launched per call so that one broken page cannot leak
//! state into the next source.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig};
use futures::StreamExt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::BrowserSettings;

/// Errors that can occur while extracting links from a page
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
    #[error("Extraction script failed: {0}")]
    Script(String),
    #[error("Extraction script returned an unexpected value: {0}")]
    UnexpectedResult(String),
    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

/// Page-driving collaborator used by the coordinator
#[async_trait]
pub trait Browser: Send + Sync {
    /// Open `source_url`, evaluate `script` and return the strings it yields
    async fn run(&self, source_url: &str, script: &str) -> Result<Vec<String>, ExtractionError>;
}

/// Configuration for the Chrome browser
#[derive(Debug, Clone)]
pub struct ChromeConfig {
    /// Run without a visible window
    pub headless: bool,
    /// Explicit Chrome/Chromium binary; auto-detected when unset
    pub executable: Option<PathBuf>,
    /// Upper bound for navigation and for script evaluation, each
    pub timeout: Duration,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl From<&BrowserSettings> for ChromeConfig {
    fn from(settings: &BrowserSettings) -> Self {
        Self {
            headless: settings.headless,
            executable: settings.executable.clone(),
            timeout: Duration::from_secs(settings.navigation_timeout_secs),
        }
    }
}

/// Headless Chrome over the DevTools protocol
pub struct ChromeBrowser {
    config: ChromeConfig,
}

impl ChromeBrowser {
    /// Create a new Chrome browser collaborator
    pub fn new(config: ChromeConfig) -> Self {
        Self { config }
    }

    fn launch_config(&self) -> Result<BrowserConfig, ExtractionError> {
        let mut builder = BrowserConfig::builder().request_timeout(self.config.timeout);
        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.config.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(ExtractionError::Launch)
    }

    async fn extract(
        &self,
        browser: &CdpBrowser,
        source_url: &str,
        script: &str,
    ) -> Result<Vec<String>, ExtractionError> {
        let timeout = self.config.timeout;
        let navigation_error = |message: String| ExtractionError::Navigation {
            url: source_url.to_string(),
            message,
        };

        let page = tokio::time::timeout(timeout, browser.new_page(source_url))
            .await
            .map_err(|_| ExtractionError::Timeout(timeout))?
            .map_err(|e| navigation_error(e.to_string()))?;

        tokio::time::timeout(timeout, page.wait_for_navigation())
            .await
            .map_err(|_| ExtractionError::Timeout(timeout))?
            .map_err(|e| navigation_error(e.to_string()))?;

        let evaluation = tokio::time::timeout(timeout, page.evaluate(script))
            .await
            .map_err(|_| ExtractionError::Timeout(timeout))?
            .map_err(|e| ExtractionError::Script(e.to_string()))?;

        let value: serde_json::Value = evaluation
            .into_value()
            .map_err(|e| ExtractionError::UnexpectedResult(e.to_string()))?;

        if let Err(e) = page.close().await {
            debug!("Failed to close page for {}: {}", source_url, e);
        }

        strings_from_value(value)
    }
}

#[async_trait]
impl Browser for ChromeBrowser {
    async fn run(&self, source_url: &str, script: &str) -> Result<Vec<String>, ExtractionError> {
        let launch = self.launch_config()?;
        let (mut browser, mut handler) = CdpBrowser::launch(launch)
            .await
            .map_err(|e| ExtractionError::Launch(e.to_string()))?;

        // The DevTools handler must be polled for the browser to make progress
        let driver = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = self.extract(&browser, source_url, script).await;

        if let Err(e) = browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        driver.abort();

        result
    }
}

/// Keep the string elements of a script result, discarding everything else
fn strings_from_value(value: serde_json::Value) -> Result<Vec<String>, ExtractionError> {
    match value {
        serde_json::Value::Array(items) => {
            let total = items.len();
            let strings: Vec<String> = items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s),
                    _ => None,
                })
                .collect();
            if strings.len() < total {
                debug!("Discarded {} non-string script results", total - strings.len());
            }
            Ok(strings)
        }
        serde_json::Value::Null => Ok(Vec::new()),
        other => Err(ExtractionError::UnexpectedResult(format!(
            "expected an array of strings, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
