//! HTTP server — axum REST API + embedded dashboard.

pub mod handlers;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::db::store::Store;
use crate::pipeline::IngestionPipeline;

/// Shared state accessible by all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestionPipeline>,
    pub store: Store,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(pipeline: IngestionPipeline) -> Self {
        let store = pipeline.store().clone();
        Self {
            pipeline: Arc::new(pipeline),
            store,
            started_at: Instant::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/health", get(handlers::health))
        .route("/api/news/search", get(handlers::search))
        .route("/api/news", get(handlers::list_news))
        .route("/api/news/{id}", get(handlers::get_article))
        .route("/api/news/{id}/reprocess", post(handlers::reprocess))
        .route("/api/analytics/sentiment", get(handlers::analytics_sentiment))
        .route("/api/analytics/keywords", get(handlers::analytics_keywords))
        .route("/api/analytics/trend", get(handlers::analytics_trend))
        .route("/api/analytics/searches", get(handlers::analytics_searches))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let addr = format!("{bind}:{port}");
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind server to {addr}"))?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
