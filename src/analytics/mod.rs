//! Read-only aggregate projections for the dashboard.
//!
//! All queries run against the same pool the pipeline writes through,
//! so results reflect every committed resolve immediately.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::db::store::Store;

#[derive(Debug, Clone, Serialize)]
pub struct SentimentDistribution {
    pub positive: i64,
    pub negative: i64,
    pub neutral: i64,
    pub total: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: i64,
}

/// One day of the sentiment trend, keyed by publish date (YYYY-MM-DD).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrendPoint {
    pub day: String,
    pub positive: i64,
    pub negative: i64,
    pub neutral: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchStats {
    pub total_searches: i64,
    pub unique_requesters: i64,
    pub cache_hits: i64,
    pub avg_duration_ms: f64,
}

fn cutoff_rfc3339(days: u32) -> String {
    (Utc::now() - Duration::days(days as i64)).to_rfc3339()
}

/// Article counts per sentiment label over the trailing window.
pub async fn sentiment_distribution(store: &Store, days: u32) -> Result<SentimentDistribution> {
    let row: (i64, i64, i64, i64) = sqlx::query_as(
        "SELECT
             COALESCE(SUM(CASE WHEN sentiment_label = 'POSITIVE' THEN 1 ELSE 0 END), 0),
             COALESCE(SUM(CASE WHEN sentiment_label = 'NEGATIVE' THEN 1 ELSE 0 END), 0),
             COALESCE(SUM(CASE WHEN sentiment_label = 'NEUTRAL' THEN 1 ELSE 0 END), 0),
             COUNT(*)
         FROM articles WHERE julianday(created_at) >= julianday(?)",
    )
    .bind(cutoff_rfc3339(days))
    .fetch_one(store.pool())
    .await
    .context("Failed to compute sentiment distribution")?;

    Ok(SentimentDistribution {
        positive: row.0,
        negative: row.1,
        neutral: row.2,
        total: row.3,
    })
}

/// Keywords with the most collected articles over the trailing window.
pub async fn top_keywords(store: &Store, days: u32, limit: u32) -> Result<Vec<KeywordCount>> {
    let rows = sqlx::query_as::<_, KeywordCount>(
        "SELECT keyword, COUNT(*) AS count
         FROM articles WHERE julianday(created_at) >= julianday(?)
         GROUP BY keyword ORDER BY count DESC, keyword LIMIT ?",
    )
    .bind(cutoff_rfc3339(days))
    .bind(limit as i64)
    .fetch_all(store.pool())
    .await
    .context("Failed to compute top keywords")?;

    Ok(rows)
}

/// Per-day sentiment counts, bucketed by publish date, oldest first.
pub async fn daily_trend(store: &Store, days: u32) -> Result<Vec<TrendPoint>> {
    let rows = sqlx::query_as::<_, TrendPoint>(
        "SELECT date(published_at) AS day,
             COALESCE(SUM(CASE WHEN sentiment_label = 'POSITIVE' THEN 1 ELSE 0 END), 0) AS positive,
             COALESCE(SUM(CASE WHEN sentiment_label = 'NEGATIVE' THEN 1 ELSE 0 END), 0) AS negative,
             COALESCE(SUM(CASE WHEN sentiment_label = 'NEUTRAL' THEN 1 ELSE 0 END), 0) AS neutral
         FROM articles WHERE julianday(published_at) >= julianday(?)
         GROUP BY day ORDER BY day",
    )
    .bind(cutoff_rfc3339(days))
    .fetch_all(store.pool())
    .await
    .context("Failed to compute daily trend")?;

    Ok(rows)
}

/// Search volume over the trailing window.
pub async fn search_stats(store: &Store, days: u32) -> Result<SearchStats> {
    let row: (i64, i64, i64, Option<f64>) = sqlx::query_as(
        "SELECT
             COUNT(*),
             COUNT(DISTINCT requester),
             COALESCE(SUM(CASE WHEN served_from_cache THEN 1 ELSE 0 END), 0),
             AVG(duration_ms)
         FROM search_logs WHERE julianday(created_at) >= julianday(?)",
    )
    .bind(cutoff_rfc3339(days))
    .fetch_one(store.pool())
    .await
    .context("Failed to compute search stats")?;

    Ok(SearchStats {
        total_searches: row.0,
        unique_requesters: row.1,
        cache_hits: row.2,
        avg_duration_ms: row.3.unwrap_or(0.0),
    })
}
