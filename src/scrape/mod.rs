//! Best-effort article page fetching.
//!
//! When a source candidate arrives with only a teaser, the pipeline
//! tries the article page itself and extracts readable text from it.
//! Every failure here is recoverable; the pipeline falls back to the
//! teaser text.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the page at `url` and return its readable text.
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpContentFetcher {
    client: reqwest::Client,
}

impl HttpContentFetcher {
    pub fn new(timeout_seconds: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch article page: {url}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Article page returned status {status}: {url}"));
        }

        let body = response
            .text()
            .await
            .context("Failed to read article page body")?;

        // `Html` is not Send, so extraction stays in a sync helper and
        // never crosses an await point.
        let text = extract_article_text(&body);
        debug!(url, chars = text.len(), "Extracted article text");

        Ok(text)
    }
}

/// Extract readable text from an HTML document: paragraph contents,
/// whitespace-normalized, in document order.
fn extract_article_text(html: &str) -> String {
    let document = Html::parse_document(html);

    // Selector::parse only fails on malformed selector strings.
    let Ok(paragraphs) = Selector::parse("article p, main p, p") else {
        return String::new();
    };

    let mut seen = std::collections::HashSet::new();
    let mut chunks = Vec::new();

    for element in document.select(&paragraphs) {
        let text: String = element.text().collect::<Vec<_>>().join(" ");
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        // The compound selector matches nested containers more than once.
        if normalized.len() > 20 && seen.insert(normalized.clone()) {
            chunks.push(normalized);
        }
    }

    chunks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_paragraph_text() {
        let html = r#"
            <html><body>
            <nav><p>x</p></nav>
            <article>
                <p>The first paragraph of the story, with enough text to keep.</p>
                <p>A second paragraph continues the report in more detail.</p>
            </article>
            <script>var ignored = true;</script>
            </body></html>
        "#;
        let text = extract_article_text(html);
        assert!(text.contains("first paragraph of the story"));
        assert!(text.contains("second paragraph"));
        assert!(!text.contains("ignored"));
    }

    #[test]
    fn test_short_fragments_dropped() {
        let html = "<p>ok</p><p>Subscribe</p>";
        assert_eq!(extract_article_text(html), "");
    }

    #[test]
    fn test_whitespace_normalized() {
        let html = "<p>Line   one\n\n  continues    with   gaps in the middle of it.</p>";
        let text = extract_article_text(html);
        assert_eq!(text, "Line one continues with gaps in the middle of it.");
    }
}
