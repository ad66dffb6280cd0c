//! linkledger: harvest links from web pages into a deduplicated record table
//!
//! - Per-source link extraction through a headless browser
//! - URL validation and query-parameter normalization
//! - Deduplication against everything the table already holds
//! - A comma-separated record table with atomic rewrites
//! - A JSON API for review tools and a Gist mirror of the table

pub mod config;
pub mod http;
pub mod scraping;
pub mod store;
pub mod sync;
pub mod types;
pub mod util;

pub use config::Config;
pub use types::*;
