//! Domain types for articles, enrichment results, and search logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A raw article stub returned by the news source, not yet enriched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsCandidate {
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    pub source_name: String,
    pub source_url: Option<String>,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::Negative => "NEGATIVE",
            Self::Neutral => "NEUTRAL",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "POSITIVE" => Ok(Self::Positive),
            "NEGATIVE" => Ok(Self::Negative),
            "NEUTRAL" => Ok(Self::Neutral),
            other => Err(format!("unknown sentiment label: {other}")),
        }
    }
}

/// Sentiment classification. `confidence` is in [0, 1], `score` in [-1, 1]
/// (negative = negative sentiment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub confidence: f64,
    pub score: f64,
}

/// Summary + sentiment attached to every persisted article. The pipeline
/// guarantees this is always present, substituting a deterministic fallback
/// when the enrichment service fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub summary: String,
    pub sentiment: Sentiment,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleCategory {
    Business,
    Technology,
    Sports,
    Politics,
    Science,
    Health,
    Entertainment,
    #[serde(untagged)]
    Other(String),
}

/// Derived article metadata, computed once at creation from the resolved
/// content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub word_count: u32,
    pub reading_time_minutes: u32,
    pub category: ArticleCategory,
    pub language: String,
}

/// Average adult reading speed used for the reading-time estimate.
const WORDS_PER_MINUTE: u32 = 200;

impl ArticleMetadata {
    /// Derive metadata from the article title and resolved content.
    pub fn derive(title: &str, content: &str) -> Self {
        let word_count = content.split_whitespace().count() as u32;
        let reading_time_minutes = word_count.div_ceil(WORDS_PER_MINUTE).max(1);
        let category = infer_category(&format!("{title} {content}"));

        Self {
            word_count,
            reading_time_minutes,
            category,
            language: "en".to_string(),
        }
    }
}

/// Infer an article category from its text using keyword matching.
///
/// Falls back to `Other("general")` if no keywords match.
pub fn infer_category(text: &str) -> ArticleCategory {
    let t = text.to_lowercase();

    if contains_any(&t, &[
        "stock", "market", "economy", "inflation", "earnings", "revenue",
        "ipo", "merger", "acquisition", "startup funding", "interest rate",
        "federal reserve", "gdp", "trade deal", "tariff",
    ]) {
        return ArticleCategory::Business;
    }

    if contains_any(&t, &[
        "software", "hardware", "smartphone", "artificial intelligence",
        " ai ", "machine learning", "cyber", "semiconductor", "chip",
        "cloud computing", "blockchain", "crypto", "silicon valley",
        "data breach", "app ",
    ]) {
        return ArticleCategory::Technology;
    }

    if contains_any(&t, &[
        "nfl", "nba", "nhl", "mlb", "soccer", "football", "basketball",
        "baseball", "hockey", "tennis", "golf", "championship",
        "super bowl", "world cup", "playoffs", "olympics", "tournament",
    ]) {
        return ArticleCategory::Sports;
    }

    if contains_any(&t, &[
        "election", "vote", "ballot", "congress", "senate", "parliament",
        "president", "governor", "legislation", "policy", "minister",
        "campaign", "referendum", "diplomat", "sanction",
    ]) {
        return ArticleCategory::Politics;
    }

    if contains_any(&t, &[
        "research", "study finds", "scientist", "climate", "nasa", "space",
        "asteroid", "telescope", "physics", "biology", "discovery",
    ]) {
        return ArticleCategory::Science;
    }

    if contains_any(&t, &[
        "health", "vaccine", "virus", "disease", "hospital", "cancer",
        "drug", "fda", "outbreak", "mental health", "pandemic",
    ]) {
        return ArticleCategory::Health;
    }

    if contains_any(&t, &[
        "movie", "film", "actor", "actress", "album", "concert", "netflix",
        "box office", "celebrity", "grammy", "oscar", "premiere",
    ]) {
        return ArticleCategory::Entertainment;
    }

    ArticleCategory::Other("general".to_string())
}

/// Check if text contains any of the given keywords.
fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

/// An enriched, persisted article. Unique per source `url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub source_name: String,
    pub source_url: Option<String>,
    pub published_at: DateTime<Utc>,
    /// Lowercased search term under which this article was first collected.
    pub keyword: String,
    pub analysis: AiAnalysis,
    pub metadata: ArticleMetadata,
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// Assemble a new article from a source candidate, the resolved content,
    /// and an enrichment result (real or fallback).
    pub fn assemble(
        keyword: &str,
        candidate: &NewsCandidate,
        url: String,
        content: String,
        summary: String,
        sentiment: Sentiment,
    ) -> Self {
        let metadata = ArticleMetadata::derive(&candidate.title, &content);
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            url,
            title: candidate.title.clone(),
            description: candidate.description.clone().unwrap_or_default(),
            content,
            source_name: candidate.source_name.clone(),
            source_url: candidate.source_url.clone(),
            published_at: candidate.published_at,
            keyword: keyword.to_string(),
            analysis: AiAnalysis {
                summary,
                sentiment,
                processed_at: now,
            },
            metadata,
            created_at: now,
        }
    }
}

/// Per-label article counts, used for search logs and analytics summaries.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SentimentTally {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
}

impl SentimentTally {
    pub fn from_articles(articles: &[Article]) -> Self {
        let mut tally = Self::default();
        for article in articles {
            match article.analysis.sentiment.label {
                SentimentLabel::Positive => tally.positive += 1,
                SentimentLabel::Negative => tally.negative += 1,
                SentimentLabel::Neutral => tally.neutral += 1,
            }
        }
        tally
    }
}

/// Append-only record of one search invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchLog {
    pub id: String,
    pub keyword: String,
    pub requester: Option<String>,
    pub origin: Option<String>,
    pub result_count: u32,
    pub duration_ms: u64,
    pub sentiment: SentimentTally,
    pub served_from_cache: bool,
    pub created_at: DateTime<Utc>,
}

impl SearchLog {
    pub fn new(
        keyword: &str,
        requester: Option<String>,
        origin: Option<String>,
        articles: &[Article],
        duration_ms: u64,
        served_from_cache: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            keyword: keyword.to_string(),
            requester,
            origin,
            result_count: articles.len() as u32,
            duration_ms,
            sentiment: SentimentTally::from_articles(articles),
            served_from_cache,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str) -> NewsCandidate {
        NewsCandidate {
            title: title.to_string(),
            description: Some("A description.".to_string()),
            content: None,
            url: Some("https://example.com/a".to_string()),
            source_name: "Example".to_string(),
            source_url: Some("https://example.com".to_string()),
            published_at: Utc::now(),
        }
    }

    #[test]
    fn test_metadata_word_count_and_reading_time() {
        let content = (0..450).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let meta = ArticleMetadata::derive("Title", &content);
        assert_eq!(meta.word_count, 450);
        // 450 words at 200 wpm rounds up to 3 minutes
        assert_eq!(meta.reading_time_minutes, 3);
        assert_eq!(meta.language, "en");
    }

    #[test]
    fn test_metadata_reading_time_minimum() {
        let meta = ArticleMetadata::derive("Short", "just a few words here");
        assert_eq!(meta.reading_time_minutes, 1);
    }

    #[test]
    fn test_category_detection() {
        assert_eq!(
            infer_category("Lakers clinch the NBA championship"),
            ArticleCategory::Sports
        );
        assert_eq!(
            infer_category("Senate passes new election legislation"),
            ArticleCategory::Politics
        );
        assert_eq!(
            infer_category("New vaccine approved by the FDA"),
            ArticleCategory::Health
        );
        assert_eq!(
            infer_category("A quiet day in the village"),
            ArticleCategory::Other("general".to_string())
        );
    }

    #[test]
    fn test_sentiment_label_round_trip() {
        assert_eq!("POSITIVE".parse::<SentimentLabel>().unwrap(), SentimentLabel::Positive);
        assert_eq!("neutral".parse::<SentimentLabel>().unwrap(), SentimentLabel::Neutral);
        assert!("MIXED".parse::<SentimentLabel>().is_err());
        assert_eq!(SentimentLabel::Negative.to_string(), "NEGATIVE");
    }

    #[test]
    fn test_sentiment_label_serde_uppercase() {
        let json = serde_json::to_string(&SentimentLabel::Positive).unwrap();
        assert_eq!(json, "\"POSITIVE\"");
    }

    #[test]
    fn test_assemble_populates_analysis_and_metadata() {
        let c = candidate("Markets rally on earnings surprise");
        let sentiment = Sentiment {
            label: SentimentLabel::Positive,
            confidence: 0.9,
            score: 0.8,
        };
        let article = Article::assemble(
            "markets",
            &c,
            "https://example.com/a".to_string(),
            "Stocks climbed today as earnings beat expectations across the market.".to_string(),
            "Stocks climbed.".to_string(),
            sentiment,
        );

        assert_eq!(article.keyword, "markets");
        assert_eq!(article.analysis.summary, "Stocks climbed.");
        assert_eq!(article.analysis.sentiment.label, SentimentLabel::Positive);
        assert!(article.metadata.word_count > 0);
        assert!(!article.id.is_empty());
    }

    #[test]
    fn test_sentiment_tally() {
        let c = candidate("t");
        let mk = |label| {
            Article::assemble(
                "k",
                &c,
                format!("https://example.com/{}", Uuid::new_v4()),
                "some content".to_string(),
                "s".to_string(),
                Sentiment { label, confidence: 0.5, score: 0.0 },
            )
        };
        let articles = vec![
            mk(SentimentLabel::Positive),
            mk(SentimentLabel::Positive),
            mk(SentimentLabel::Negative),
            mk(SentimentLabel::Neutral),
        ];
        let tally = SentimentTally::from_articles(&articles);
        assert_eq!(tally.positive, 2);
        assert_eq!(tally.negative, 1);
        assert_eq!(tally.neutral, 1);
    }
}
