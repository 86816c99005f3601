//! News ingestion and enrichment backend.
//!
//! Keyword searches fan out to an external news provider, articles are
//! deduplicated, backfilled, and AI-enriched, then persisted to SQLite
//! and served alongside aggregate analytics over an axum REST API.

pub mod analytics;
pub mod articles;
pub mod config;
pub mod db;
pub mod enrich;
pub mod logging;
pub mod pipeline;
pub mod scrape;
pub mod sources;
pub mod web;
