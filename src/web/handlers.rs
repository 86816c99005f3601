//! Route handlers.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use crate::analytics;
use crate::articles::models::{SearchLog, SentimentLabel};
use crate::pipeline::ResolveError;
use crate::web::AppState;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

pub async fn index() -> impl IntoResponse {
    let html = include_str!("../../static/index.html");
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html)
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let articles = state.store.count_articles().await.unwrap_or(-1);
    let searches = state.store.count_searches().await.unwrap_or(-1);

    Json(json!({
        "status": "ok",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "articles": articles,
        "searches": searches,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    keyword: Option<String>,
    requester: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let keyword = params.keyword.unwrap_or_default();

    let outcome = match state.pipeline.resolve(&keyword).await {
        Ok(outcome) => outcome,
        Err(e) => return resolve_error_response(e),
    };

    let log = SearchLog::new(
        &keyword.trim().to_lowercase(),
        params.requester,
        Some("api".to_string()),
        &outcome.articles,
        outcome.elapsed_ms,
        outcome.served_from_cache,
    );
    if let Err(e) = state.store.insert_search_log(&log).await {
        warn!(error = %e, "Failed to record search log");
    }

    (
        StatusCode::OK,
        Json(json!({
            "articles": outcome.articles,
            "served_from_cache": outcome.served_from_cache,
            "elapsed_ms": outcome.elapsed_ms,
            "count": outcome.articles.len(),
        })),
    )
}

fn resolve_error_response(e: ResolveError) -> (StatusCode, Json<serde_json::Value>) {
    match e {
        ResolveError::InvalidKeyword(reason) => {
            (StatusCode::BAD_REQUEST, Json(json!({"error": reason})))
        }
        ResolveError::SourceUnavailable(source) => {
            warn!(error = %source, "News source unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"error": "news source unavailable"})),
            )
        }
        ResolveError::Internal(e) => {
            error!(error = %e, "Resolve failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "internal error"})),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    sentiment: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
}

pub async fn list_news(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let label = match params.sentiment.as_deref() {
        Some(raw) => match raw.parse::<SentimentLabel>() {
            Ok(label) => Some(label),
            Err(reason) => {
                return (StatusCode::BAD_REQUEST, Json(json!({"error": reason})));
            }
        },
        None => None,
    };

    let page = params.page.unwrap_or(1).max(1);
    let page_size = params
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    // Widen before multiplying: page is caller-controlled and u32
    // arithmetic overflows at page counts SQLite happily accepts.
    let offset = (page as u64 - 1) * page_size as u64;

    match state.store.find_by_sentiment(label, page_size, offset).await {
        Ok(articles) => (
            StatusCode::OK,
            Json(json!({
                "articles": articles,
                "page": page,
                "page_size": page_size,
                "count": articles.len(),
            })),
        ),
        Err(e) => {
            error!(error = %e, "Article listing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "internal error"})),
            )
        }
    }
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.find_by_id(&id).await {
        Ok(Some(article)) => (StatusCode::OK, Json(json!(article))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "article not found"})),
        ),
        Err(e) => {
            error!(error = %e, id, "Article lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "internal error"})),
            )
        }
    }
}

pub async fn reprocess(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.pipeline.reprocess(&id).await {
        Ok(Some(article)) => (StatusCode::OK, Json(json!(article))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "article not found"})),
        ),
        Err(e) => {
            error!(error = %e, id, "Reprocess failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "reprocess failed"})),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WindowParams {
    days: Option<u32>,
    limit: Option<u32>,
}

impl WindowParams {
    fn days(&self) -> u32 {
        self.days.unwrap_or(7).clamp(1, 365)
    }

    fn limit(&self) -> u32 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}

pub async fn analytics_sentiment(
    State(state): State<AppState>,
    Query(params): Query<WindowParams>,
) -> impl IntoResponse {
    match analytics::sentiment_distribution(&state.store, params.days()).await {
        Ok(distribution) => Json(serde_json::to_value(&distribution).unwrap_or_default()),
        Err(e) => Json(json!({"error": e.to_string()})),
    }
}

pub async fn analytics_keywords(
    State(state): State<AppState>,
    Query(params): Query<WindowParams>,
) -> impl IntoResponse {
    match analytics::top_keywords(&state.store, params.days(), params.limit()).await {
        Ok(keywords) => Json(serde_json::to_value(&keywords).unwrap_or_default()),
        Err(e) => Json(json!({"error": e.to_string()})),
    }
}

pub async fn analytics_trend(
    State(state): State<AppState>,
    Query(params): Query<WindowParams>,
) -> impl IntoResponse {
    match analytics::daily_trend(&state.store, params.days()).await {
        Ok(trend) => Json(serde_json::to_value(&trend).unwrap_or_default()),
        Err(e) => Json(json!({"error": e.to_string()})),
    }
}

pub async fn analytics_searches(
    State(state): State<AppState>,
    Query(params): Query<WindowParams>,
) -> impl IntoResponse {
    match analytics::search_stats(&state.store, params.days()).await {
        Ok(stats) => Json(serde_json::to_value(&stats).unwrap_or_default()),
        Err(e) => Json(json!({"error": e.to_string()})),
    }
}
