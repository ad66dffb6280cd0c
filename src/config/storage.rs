//! Record table configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Record table location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the comma-separated record table
    pub table_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            table_path: PathBuf::from("links.csv"),
        }
    }
}
