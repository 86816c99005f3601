//! External news providers.
//!
//! A `NewsSource` turns a search keyword into raw article candidates.
//! The pipeline treats every source failure as the whole search being
//! unavailable; partial results are never synthesized here.

pub mod newsapi;

use async_trait::async_trait;
use thiserror::Error;

use crate::articles::models::NewsCandidate;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("news source is not configured: {0}")]
    Unconfigured(String),

    #[error("news source request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("news source returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Search for up to `limit` candidates matching the keyword,
    /// newest first.
    async fn search(&self, keyword: &str, limit: u32) -> Result<Vec<NewsCandidate>, SourceError>;

    fn name(&self) -> &str;
}
