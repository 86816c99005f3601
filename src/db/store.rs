use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

use crate::articles::models::{
    AiAnalysis, Article, ArticleCategory, ArticleMetadata, SearchLog, Sentiment, SentimentLabel,
};

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

/// Flat row shape for the articles table. Timestamps are RFC 3339 text,
/// which sorts chronologically and works with SQLite date functions.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ArticleRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub source_name: String,
    pub source_url: Option<String>,
    pub published_at: String,
    pub keyword: String,
    pub summary: String,
    pub sentiment_label: String,
    pub sentiment_confidence: f64,
    pub sentiment_score: f64,
    pub processed_at: String,
    pub word_count: i64,
    pub reading_time_minutes: i64,
    pub category: String,
    pub language: String,
    pub created_at: String,
}

impl ArticleRecord {
    fn from_article(article: &Article) -> Self {
        Self {
            id: article.id.clone(),
            url: article.url.clone(),
            title: article.title.clone(),
            description: article.description.clone(),
            content: article.content.clone(),
            source_name: article.source_name.clone(),
            source_url: article.source_url.clone(),
            published_at: article.published_at.to_rfc3339(),
            keyword: article.keyword.clone(),
            summary: article.analysis.summary.clone(),
            sentiment_label: article.analysis.sentiment.label.to_string(),
            sentiment_confidence: article.analysis.sentiment.confidence,
            sentiment_score: article.analysis.sentiment.score,
            processed_at: article.analysis.processed_at.to_rfc3339(),
            word_count: article.metadata.word_count as i64,
            reading_time_minutes: article.metadata.reading_time_minutes as i64,
            category: category_to_str(&article.metadata.category).to_string(),
            language: article.metadata.language.clone(),
            created_at: article.created_at.to_rfc3339(),
        }
    }

    fn into_article(self) -> Result<Article> {
        Ok(Article {
            published_at: parse_timestamp(&self.published_at)?,
            analysis: AiAnalysis {
                summary: self.summary,
                sentiment: Sentiment {
                    label: SentimentLabel::from_str(&self.sentiment_label)
                        .map_err(|e| anyhow::anyhow!(e))?,
                    confidence: self.sentiment_confidence,
                    score: self.sentiment_score,
                },
                processed_at: parse_timestamp(&self.processed_at)?,
            },
            metadata: ArticleMetadata {
                word_count: self.word_count as u32,
                reading_time_minutes: self.reading_time_minutes as u32,
                category: category_from_str(&self.category),
                language: self.language,
            },
            created_at: parse_timestamp(&self.created_at)?,
            id: self.id,
            url: self.url,
            title: self.title,
            description: self.description,
            content: self.content,
            source_name: self.source_name,
            source_url: self.source_url,
            keyword: self.keyword,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let dt = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid stored timestamp: {raw}"))?;
    Ok(dt.with_timezone(&Utc))
}

fn category_to_str(category: &ArticleCategory) -> &str {
    match category {
        ArticleCategory::Business => "business",
        ArticleCategory::Technology => "technology",
        ArticleCategory::Sports => "sports",
        ArticleCategory::Politics => "politics",
        ArticleCategory::Science => "science",
        ArticleCategory::Health => "health",
        ArticleCategory::Entertainment => "entertainment",
        ArticleCategory::Other(name) => name,
    }
}

fn category_from_str(raw: &str) -> ArticleCategory {
    match raw {
        "business" => ArticleCategory::Business,
        "technology" => ArticleCategory::Technology,
        "sports" => ArticleCategory::Sports,
        "politics" => ArticleCategory::Politics,
        "science" => ArticleCategory::Science,
        "health" => ArticleCategory::Health,
        "entertainment" => ArticleCategory::Entertainment,
        other => ArticleCategory::Other(other.to_string()),
    }
}

impl Store {
    /// Create a Store from an existing pool (for sharing between the
    /// pipeline and the web layer).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn new(database_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{database_path}"))
            .context("Invalid database path")?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        // In-memory SQLite is per-connection; a wider pool would hand
        // out empty databases.
        let max_connections = if database_path.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        let migration_sql = include_str!("../../migrations/001_init.sql");
        // Execute each statement separately (sqlx doesn't support multiple statements in one call)
        for statement in migration_sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .with_context(|| format!("Failed to execute migration: {trimmed}"))?;
            }
        }
        Ok(())
    }

    // --- Article operations ---

    /// Insert the article unless a row with the same url already exists.
    ///
    /// Returns the persisted article and whether this call created it.
    /// The unique index on `url` is the only guard against concurrent
    /// resolves persisting the same article; the loser of the race gets
    /// the winner's row back.
    pub async fn create_if_absent(&self, article: &Article) -> Result<(Article, bool)> {
        let record = ArticleRecord::from_article(article);

        let result = sqlx::query(
            "INSERT INTO articles (id, url, title, description, content, source_name, source_url, published_at, keyword, summary, sentiment_label, sentiment_confidence, sentiment_score, processed_at, word_count, reading_time_minutes, category, language, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(url) DO NOTHING",
        )
        .bind(&record.id)
        .bind(&record.url)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.content)
        .bind(&record.source_name)
        .bind(&record.source_url)
        .bind(&record.published_at)
        .bind(&record.keyword)
        .bind(&record.summary)
        .bind(&record.sentiment_label)
        .bind(record.sentiment_confidence)
        .bind(record.sentiment_score)
        .bind(&record.processed_at)
        .bind(record.word_count)
        .bind(record.reading_time_minutes)
        .bind(&record.category)
        .bind(&record.language)
        .bind(&record.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert article")?;

        if result.rows_affected() == 1 {
            return Ok((article.clone(), true));
        }

        let winner = self
            .find_by_url(&article.url)
            .await?
            .context("Article conflicted on url but winner row not found")?;
        Ok((winner, false))
    }

    pub async fn find_by_url(&self, url: &str) -> Result<Option<Article>> {
        let record = sqlx::query_as::<_, ArticleRecord>("SELECT * FROM articles WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch article by url")?;
        record.map(ArticleRecord::into_article).transpose()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Article>> {
        let record = sqlx::query_as::<_, ArticleRecord>("SELECT * FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch article by id")?;
        record.map(ArticleRecord::into_article).transpose()
    }

    /// Articles for a keyword published within the trailing window,
    /// newest first.
    pub async fn find_recent_by_keyword(
        &self,
        keyword: &str,
        window_hours: u32,
        limit: u32,
    ) -> Result<Vec<Article>> {
        let cutoff = Utc::now() - Duration::hours(window_hours as i64);
        let records = sqlx::query_as::<_, ArticleRecord>(
            "SELECT * FROM articles
             WHERE keyword = ? AND julianday(published_at) >= julianday(?)
             ORDER BY published_at DESC LIMIT ?",
        )
        .bind(keyword)
        .bind(cutoff.to_rfc3339())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch recent articles by keyword")?;

        records.into_iter().map(ArticleRecord::into_article).collect()
    }

    /// Paged article listing, optionally filtered by sentiment label,
    /// newest first.
    pub async fn find_by_sentiment(
        &self,
        label: Option<SentimentLabel>,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Article>> {
        let records = match label {
            Some(label) => {
                sqlx::query_as::<_, ArticleRecord>(
                    "SELECT * FROM articles WHERE sentiment_label = ?
                     ORDER BY published_at DESC LIMIT ? OFFSET ?",
                )
                .bind(label.to_string())
                .bind(limit as i64)
                .bind(offset as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, ArticleRecord>(
                    "SELECT * FROM articles ORDER BY published_at DESC LIMIT ? OFFSET ?",
                )
                .bind(limit as i64)
                .bind(offset as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to fetch articles by sentiment")?;

        records.into_iter().map(ArticleRecord::into_article).collect()
    }

    /// Overwrite the analysis of an existing article (reprocess).
    pub async fn update_analysis(&self, id: &str, analysis: &AiAnalysis) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE articles SET summary = ?, sentiment_label = ?, sentiment_confidence = ?, sentiment_score = ?, processed_at = ? WHERE id = ?",
        )
        .bind(&analysis.summary)
        .bind(analysis.sentiment.label.to_string())
        .bind(analysis.sentiment.confidence)
        .bind(analysis.sentiment.score)
        .bind(analysis.processed_at.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update article analysis")?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn count_articles(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count articles")?;
        Ok(row.0)
    }

    // --- Search log operations ---

    pub async fn insert_search_log(&self, log: &SearchLog) -> Result<()> {
        sqlx::query(
            "INSERT INTO search_logs (id, keyword, requester, origin, result_count, duration_ms, positive_count, negative_count, neutral_count, served_from_cache, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&log.id)
        .bind(&log.keyword)
        .bind(&log.requester)
        .bind(&log.origin)
        .bind(log.result_count as i64)
        .bind(log.duration_ms as i64)
        .bind(log.sentiment.positive as i64)
        .bind(log.sentiment.negative as i64)
        .bind(log.sentiment.neutral as i64)
        .bind(log.served_from_cache)
        .bind(log.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to insert search log")?;
        Ok(())
    }

    pub async fn count_searches(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM search_logs")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count search logs")?;
        Ok(row.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::articles::models::{NewsCandidate, SentimentTally};

    fn sample_article(url: &str, keyword: &str) -> Article {
        let candidate = NewsCandidate {
            title: "Sample headline".to_string(),
            description: Some("Sample description.".to_string()),
            content: None,
            url: Some(url.to_string()),
            source_name: "Example".to_string(),
            source_url: None,
            published_at: Utc::now(),
        };
        Article::assemble(
            keyword,
            &candidate,
            url.to_string(),
            "Long enough body text for a sample article used in store tests.".to_string(),
            "Sample summary.".to_string(),
            Sentiment {
                label: SentimentLabel::Positive,
                confidence: 0.9,
                score: 0.7,
            },
        )
    }

    #[tokio::test]
    async fn test_create_and_find_round_trip() {
        let store = Store::new(":memory:").await.expect("should create store");
        let article = sample_article("https://example.com/one", "markets");

        let (stored, created) = store.create_if_absent(&article).await.expect("should insert");
        assert!(created);
        assert_eq!(stored.id, article.id);

        let found = store
            .find_by_url("https://example.com/one")
            .await
            .expect("should query")
            .expect("should exist");
        assert_eq!(found.id, article.id);
        assert_eq!(found.analysis.sentiment.label, SentimentLabel::Positive);
        assert_eq!(found.metadata.language, "en");

        let by_id = store.find_by_id(&article.id).await.expect("should query");
        assert!(by_id.is_some());
    }

    #[tokio::test]
    async fn test_create_if_absent_returns_winner_on_conflict() {
        let store = Store::new(":memory:").await.expect("should create store");
        let first = sample_article("https://example.com/dup", "markets");
        let second = sample_article("https://example.com/dup", "stocks");

        let (_, created) = store.create_if_absent(&first).await.expect("should insert");
        assert!(created);

        let (winner, created) = store.create_if_absent(&second).await.expect("should resolve");
        assert!(!created);
        assert_eq!(winner.id, first.id);
        assert_eq!(winner.keyword, "markets");

        assert_eq!(store.count_articles().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_recent_by_keyword_window_and_order() {
        let store = Store::new(":memory:").await.expect("should create store");

        let mut fresh = sample_article("https://example.com/fresh", "ai");
        fresh.published_at = Utc::now() - Duration::hours(2);
        let mut fresher = sample_article("https://example.com/fresher", "ai");
        fresher.published_at = Utc::now() - Duration::hours(1);
        let mut stale = sample_article("https://example.com/stale", "ai");
        stale.published_at = Utc::now() - Duration::hours(48);
        let other = sample_article("https://example.com/other", "sports");

        for a in [&fresh, &fresher, &stale, &other] {
            store.create_if_absent(a).await.expect("should insert");
        }

        let recent = store
            .find_recent_by_keyword("ai", 24, 10)
            .await
            .expect("should query");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, fresher.id);
        assert_eq!(recent[1].id, fresh.id);
    }

    #[tokio::test]
    async fn test_find_by_sentiment_paging() {
        let store = Store::new(":memory:").await.expect("should create store");
        for i in 0..3i64 {
            let mut a = sample_article(&format!("https://example.com/p{i}"), "k");
            a.published_at = Utc::now() - Duration::hours(i);
            store.create_if_absent(&a).await.expect("should insert");
        }

        let page = store
            .find_by_sentiment(Some(SentimentLabel::Positive), 2, 0)
            .await
            .expect("should query");
        assert_eq!(page.len(), 2);

        let rest = store
            .find_by_sentiment(Some(SentimentLabel::Positive), 2, 2)
            .await
            .expect("should query");
        assert_eq!(rest.len(), 1);

        let none = store
            .find_by_sentiment(Some(SentimentLabel::Negative), 10, 0)
            .await
            .expect("should query");
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_analysis() {
        let store = Store::new(":memory:").await.expect("should create store");
        let article = sample_article("https://example.com/re", "k");
        store.create_if_absent(&article).await.expect("should insert");

        let analysis = AiAnalysis {
            summary: "Re-run summary.".to_string(),
            sentiment: Sentiment {
                label: SentimentLabel::Negative,
                confidence: 0.8,
                score: -0.6,
            },
            processed_at: Utc::now(),
        };
        let updated = store
            .update_analysis(&article.id, &analysis)
            .await
            .expect("should update");
        assert!(updated);

        let found = store.find_by_id(&article.id).await.unwrap().unwrap();
        assert_eq!(found.analysis.summary, "Re-run summary.");
        assert_eq!(found.analysis.sentiment.label, SentimentLabel::Negative);

        let missing = store
            .update_analysis("no-such-id", &analysis)
            .await
            .expect("should not error");
        assert!(!missing);
    }

    #[tokio::test]
    async fn test_search_log_insert_and_count() {
        let store = Store::new(":memory:").await.expect("should create store");
        let log = SearchLog {
            id: "log-1".to_string(),
            keyword: "markets".to_string(),
            requester: Some("user-1".to_string()),
            origin: Some("api".to_string()),
            result_count: 3,
            duration_ms: 120,
            sentiment: SentimentTally {
                positive: 2,
                negative: 0,
                neutral: 1,
            },
            served_from_cache: false,
            created_at: Utc::now(),
        };
        store.insert_search_log(&log).await.expect("should insert");
        assert_eq!(store.count_searches().await.unwrap(), 1);
    }
}
