//! HTTP API Server Module
//!
//! JSON API over the record table, for review tools that edit flags and
//! archive records.

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use server::HttpServer;
