//! GitHub Gist backend for the table mirror

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{RemoteSync, SyncError};
use crate::config::SyncConfig;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GIST_DESCRIPTION: &str = "linkledger record table";

/// File entry in a gist create/update request
#[derive(Debug, Serialize)]
struct FileContent<'a> {
    content: &'a str,
}

/// Gist create/update request body
#[derive(Debug, Serialize)]
struct GistRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    public: Option<bool>,
    files: HashMap<&'a str, FileContent<'a>>,
}

/// The parts of a gist response we use
#[derive(Debug, Deserialize)]
struct GistResponse {
    id: String,
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    #[serde(default)]
    raw_url: Option<String>,
}

/// Gist API client
#[derive(Debug)]
pub struct GistClient {
    client: Client,
    api_base: String,
    gist_id: Option<String>,
    file_name: String,
    has_token: bool,
    attempts: u32,
    retry_delay: Duration,
}

impl GistClient {
    /// Create a new gist client from sync configuration
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("linkledger/", env!("CARGO_PKG_VERSION"))),
        );

        let token = config.resolve_token();
        if let Some(token) = &token {
            let auth_value = format!("Bearer {}", token);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| SyncError::Config(format!("Invalid API token format: {}", e)))?,
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            gist_id: config.gist_id.clone().filter(|id| !id.is_empty()),
            file_name: config.file_name.clone(),
            has_token: token.is_some(),
            attempts: config.attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    fn gists_url(&self) -> String {
        format!("{}/gists", self.api_base)
    }

    fn gist_url(&self, gist_id: &str) -> String {
        format!("{}/gists/{}", self.api_base, gist_id)
    }

    fn request_body<'a>(&'a self, table_text: &'a str, create: bool) -> GistRequest<'a> {
        let mut files = HashMap::new();
        files.insert(self.file_name.as_str(), FileContent { content: table_text });
        GistRequest {
            description: create.then_some(GIST_DESCRIPTION),
            public: create.then_some(false),
            files,
        }
    }

    /// Send a request, retrying transport errors and 5xx responses a fixed
    /// number of times. 4xx responses are returned as errors immediately.
    async fn send(&self, build: impl Fn() -> RequestBuilder) -> Result<Response, SyncError> {
        let mut attempt = 1;
        loop {
            let error = match build().send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) if response.status().is_server_error() => api_error(response).await,
                Ok(response) => return Err(api_error(response).await),
                Err(e) => SyncError::Http(e),
            };

            if attempt >= self.attempts {
                return Err(error);
            }
            warn!(
                "Gist request failed (attempt {}/{}): {}",
                attempt, self.attempts, error
            );
            attempt += 1;
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn read_file(&self, gist: GistResponse) -> Result<String, SyncError> {
        let missing = || SyncError::MissingFile {
            gist_id: gist.id.clone(),
            file_name: self.file_name.clone(),
        };
        let file = gist.files.get(&self.file_name).ok_or_else(missing)?;

        match (&file.content, file.truncated, &file.raw_url) {
            (Some(content), false, _) => Ok(content.clone()),
            (_, _, Some(raw_url)) => {
                debug!("Gist file is truncated, fetching {}", raw_url);
                let response = self.send(|| self.client.get(raw_url)).await?;
                Ok(response.text().await?)
            }
            (Some(content), true, None) => Ok(content.clone()),
            (None, _, None) => Err(missing()),
        }
    }
}

async fn api_error(response: Response) -> SyncError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
    SyncError::Api { status, message }
}

#[async_trait]
impl RemoteSync for GistClient {
    async fn push(&self, table_text: &str) -> Result<String, SyncError> {
        if !self.has_token {
            return Err(SyncError::MissingToken);
        }

        let response = match &self.gist_id {
            Some(gist_id) => {
                let url = self.gist_url(gist_id);
                let body = self.request_body(table_text, false);
                self.send(|| self.client.patch(&url).json(&body)).await?
            }
            None => {
                let url = self.gists_url();
                let body = self.request_body(table_text, true);
                self.send(|| self.client.post(&url).json(&body)).await?
            }
        };

        let gist: GistResponse = response.json().await?;
        info!("Pushed {} bytes to gist {}", table_text.len(), gist.id);
        Ok(gist.id)
    }

    async fn fetch(&self) -> Result<String, SyncError> {
        let gist_id = self.gist_id.as_deref().ok_or(SyncError::MissingGistId)?;
        let url = self.gist_url(gist_id);
        let response = self.send(|| self.client.get(&url)).await?;
        let gist: GistResponse = response.json().await?;
        self.read_file(gist).await
    }
}
