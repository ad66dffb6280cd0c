//! Remote mirror of the record table
//!
//! The remote side only ever sees the table as an opaque text blob: `push`
//! uploads the current table, `fetch` downloads the mirrored copy.

mod gist;

pub use gist::GistClient;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while talking to the remote
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote responded with {status}: {message}")]
    Api { status: u16, message: String },
    #[error("No gist id configured; push once to create one")]
    MissingGistId,
    #[error("Gist {gist_id} has no file named '{file_name}'")]
    MissingFile { gist_id: String, file_name: String },
    #[error("No API token configured (set sync.token or GITHUB_TOKEN)")]
    MissingToken,
    #[error("Invalid remote configuration: {0}")]
    Config(String),
}

/// Remote sync collaborator
#[async_trait]
pub trait RemoteSync: Send + Sync {
    /// Upload the table text, returning the remote id it is stored under
    async fn push(&self, table_text: &str) -> Result<String, SyncError>;

    /// Download the mirrored table text
    async fn fetch(&self) -> Result<String, SyncError>;
}
