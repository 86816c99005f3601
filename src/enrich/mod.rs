//! AI enrichment: summaries and sentiment for article text.
//!
//! The real work happens in a separate microservice; this module owns
//! the client for it and the deterministic fallback the pipeline
//! substitutes when that service is down.

pub mod client;
pub mod fallback;

use anyhow::Result;
use async_trait::async_trait;

use crate::articles::models::Sentiment;

/// Result of enriching a single piece of article text.
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub summary: String,
    pub sentiment: Sentiment,
}

#[async_trait]
pub trait Enricher: Send + Sync {
    /// Summarize and classify the given text. Errors here are
    /// recoverable; callers substitute [`fallback::fallback_enrichment`].
    async fn enrich(&self, text: &str) -> Result<Enrichment>;
}
