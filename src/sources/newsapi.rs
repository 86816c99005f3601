//! NewsAPI.org client.
//!
//! Hits the `everything` endpoint with a single bounded request per
//! search. Candidates with unparsable timestamps are dropped rather
//! than failing the batch.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::articles::models::NewsCandidate;
use crate::sources::{NewsSource, SourceError};

pub struct NewsApiSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl NewsApiSource {
    pub fn new(base_url: String, api_key: Option<String>, timeout_seconds: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl NewsSource for NewsApiSource {
    async fn search(&self, keyword: &str, limit: u32) -> Result<Vec<NewsCandidate>, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::Unconfigured("NEWS_API_KEY not set".to_string()))?;

        let encoded = urlencoding::encode(keyword);
        let url = format!(
            "{}/v2/everything?q={encoded}&pageSize={limit}&sortBy=publishedAt&language=en",
            self.base_url
        );

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status { status, body });
        }

        let parsed: SearchResponse = response.json().await?;
        debug!(
            keyword,
            total = parsed.total_results,
            returned = parsed.articles.len(),
            "Fetched candidates from NewsAPI"
        );

        let mut candidates = Vec::new();
        for raw in parsed.articles {
            let Some(published_at) = parse_timestamp(&raw.published_at) else {
                warn!(title = %raw.title, ts = %raw.published_at, "Dropping candidate with bad timestamp");
                continue;
            };

            candidates.push(NewsCandidate {
                title: raw.title,
                description: raw.description,
                content: raw.content,
                url: raw.url,
                source_name: raw.source.name,
                source_url: raw.source.id.map(|id| format!("https://{id}.com")),
                published_at,
            });
        }

        Ok(candidates)
    }

    fn name(&self) -> &str {
        "newsapi"
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "totalResults", default)]
    total_results: u64,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    source: RawSource,
    title: String,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: String,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    id: Option<String>,
    name: String,
}
