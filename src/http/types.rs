//! HTTP API Request/Response Types
//!
//! JSON-serializable types for the HTTP API. Records themselves travel as
//! [`Record`](crate::types::Record).

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
}

/// Query parameters for listing records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordsQuery {
    /// Only records from this source
    #[serde(default)]
    pub source: Option<String>,
    /// Include archived records (default: true)
    #[serde(default)]
    pub include_archived: Option<bool>,
}

/// Upsert response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertResponse {
    /// Number of records written
    pub updated: usize,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }
}
