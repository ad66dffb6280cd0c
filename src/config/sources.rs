//! Per-source extraction configuration

use serde::{Deserialize, Serialize};

/// One configured origin of links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Entry page handed to the browser
    pub url: String,
    /// Script evaluated in the page; must yield an array of URL strings
    pub extraction_command: String,
    /// Query parameters ignored when comparing URLs from this source
    #[serde(default)]
    pub normalization_params: Vec<String>,
}

impl SourceSpec {
    /// Create a source without normalization parameters
    pub fn new(url: impl Into<String>, extraction_command: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extraction_command: extraction_command.into(),
            normalization_params: Vec::new(),
        }
    }

    /// Set the query parameters stripped for deduplication
    pub fn with_normalization_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.normalization_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Validation problems for the source called `name`
    pub(super) fn problems(&self, name: &str) -> Vec<String> {
        let mut errors = Vec::new();

        if name.trim().is_empty() {
            errors.push("source names must not be empty".to_string());
        }
        if self.url.trim().is_empty() {
            errors.push(format!("source '{}': url must not be empty", name));
        } else if !crate::scraping::is_valid_url(&self.url) {
            errors.push(format!(
                "source '{}': url '{}' is not a valid http(s) URL",
                name, self.url
            ));
        }
        if self.extraction_command.trim().is_empty() {
            errors.push(format!(
                "source '{}': extraction_command must not be empty",
                name
            ));
        }
        if self.normalization_params.iter().any(|p| p.is_empty()) {
            errors.push(format!(
                "source '{}': normalization_params must not contain empty names",
                name
            ));
        }

        errors
    }
}
