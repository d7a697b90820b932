//! faq-store - FAQ corpus sources
//!
//! This crate provides [`CorpusSource`](faq_core::CorpusSource)
//! implementations: a SQLite table of FAQ records with optional embedding
//! blobs, and a JSON export file.

mod json;
mod schema;
mod sqlite;

pub use json::JsonFaqSource;
pub use sqlite::SqliteFaqStore;

// Re-export schema for testing/migrations
pub use schema::{SCHEMA, SCHEMA_VERSION};
