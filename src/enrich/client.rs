//! HTTP client for the enrichment microservice.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::articles::models::{Sentiment, SentimentLabel};
use crate::enrich::{Enricher, Enrichment};

/// Summary length bounds sent with every request.
const SUMMARY_MAX_LENGTH: u32 = 150;
const SUMMARY_MIN_LENGTH: u32 = 50;

pub struct EnrichmentClient {
    client: reqwest::Client,
    base_url: String,
}

impl EnrichmentClient {
    pub fn new(base_url: String, timeout_seconds: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self { client, base_url }
    }
}

#[async_trait]
impl Enricher for EnrichmentClient {
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn enrich(&self, text: &str) -> Result<Enrichment> {
        let request = ProcessRequest {
            text: text.to_string(),
            max_length: SUMMARY_MAX_LENGTH,
            min_length: SUMMARY_MIN_LENGTH,
        };

        let response = self
            .client
            .post(format!("{}/process-news", self.base_url))
            .json(&request)
            .send()
            .await
            .context("Enrichment service request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            bail!("Enrichment service error ({}): {}", status, error_body);
        }

        let parsed: ProcessResponse = response
            .json()
            .await
            .context("Failed to parse enrichment response")?;

        let label: SentimentLabel = parsed
            .sentiment
            .label
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;

        let confidence = parsed.sentiment.confidence;
        let score = parsed.sentiment.sentiment_score;
        if !(0.0..=1.0).contains(&confidence) {
            bail!("Enrichment confidence out of range: {confidence}");
        }
        if !(-1.0..=1.0).contains(&score) {
            bail!("Enrichment score out of range: {score}");
        }

        info!(%label, confidence, score, "Enrichment completed");

        Ok(Enrichment {
            summary: parsed.summary,
            sentiment: Sentiment {
                label,
                confidence,
                score,
            },
        })
    }
}

// --- Request/Response Types ---

#[derive(Debug, Serialize)]
struct ProcessRequest {
    text: String,
    max_length: u32,
    min_length: u32,
}

#[derive(Debug, Deserialize)]
struct ProcessResponse {
    summary: String,
    sentiment: SentimentPayload,
}

#[derive(Debug, Deserialize)]
struct SentimentPayload {
    label: String,
    confidence: f64,
    sentiment_score: f64,
}
