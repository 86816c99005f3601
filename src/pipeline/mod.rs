//! The ingestion pipeline: keyword search to persisted, enriched
//! articles.
//!
//! A resolve either answers from fresh stored articles (cache gate) or
//! fetches candidates from the news source and processes each one
//! independently: dedup by url, backfill thin content from the article
//! page, enrich (with fallback), persist. One bad candidate never
//! fails the batch; an unreachable news source fails the whole call.

pub mod policy;

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::articles::models::{Article, NewsCandidate};
use crate::db::store::Store;
use crate::enrich::fallback::fallback_enrichment;
use crate::enrich::{Enricher, Enrichment};
use crate::pipeline::policy::FreshnessPolicy;
use crate::scrape::ContentFetcher;
use crate::sources::{NewsSource, SourceError};

/// Candidate text shorter than this triggers a page fetch.
const SCRAPE_THRESHOLD_CHARS: usize = 200;
/// Candidates whose resolved text is still shorter than this are skipped.
const MIN_CONTENT_CHARS: usize = 50;
/// Longest accepted search keyword.
const MAX_KEYWORD_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid keyword: {0}")]
    InvalidKeyword(String),

    #[error("news source unavailable: {0}")]
    SourceUnavailable(#[source] SourceError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Result of one keyword resolve.
#[derive(Debug)]
pub struct SearchOutcome {
    pub articles: Vec<Article>,
    pub served_from_cache: bool,
    pub elapsed_ms: u64,
}

/// What happened to one source candidate during a fetch-path resolve.
enum CandidateOutcome {
    Created(Article),
    ReusedExisting(Article),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy)]
enum SkipReason {
    MissingUrl,
    ContentTooShort,
    StoreError,
}

pub struct IngestionPipeline {
    source: Arc<dyn NewsSource>,
    fetcher: Arc<dyn ContentFetcher>,
    enricher: Arc<dyn Enricher>,
    store: Store,
    policy: FreshnessPolicy,
}

impl IngestionPipeline {
    pub fn new(
        source: Arc<dyn NewsSource>,
        fetcher: Arc<dyn ContentFetcher>,
        enricher: Arc<dyn Enricher>,
        store: Store,
        policy: FreshnessPolicy,
    ) -> Self {
        Self {
            source,
            fetcher,
            enricher,
            store,
            policy,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Resolve a keyword search into enriched articles.
    #[instrument(skip(self))]
    pub async fn resolve(&self, keyword: &str) -> Result<SearchOutcome, ResolveError> {
        let started = Instant::now();
        let keyword = normalize_keyword(keyword)?;

        let cached = self
            .store
            .find_recent_by_keyword(
                &keyword,
                self.policy.cache_window_hours,
                self.policy.cache_max_articles,
            )
            .await?;

        if self.policy.satisfied_by(cached.len()) {
            info!(
                keyword,
                count = cached.len(),
                "Serving search from fresh stored articles"
            );
            return Ok(SearchOutcome {
                articles: cached,
                served_from_cache: true,
                elapsed_ms: started.elapsed().as_millis() as u64,
            });
        }

        let candidates = self
            .source
            .search(&keyword, self.policy.cache_max_articles)
            .await
            .map_err(ResolveError::SourceUnavailable)?;

        info!(
            keyword,
            candidates = candidates.len(),
            source = self.source.name(),
            "Processing fetched candidates"
        );

        let mut articles = Vec::new();
        let mut created = 0usize;
        let mut reused = 0usize;

        for candidate in &candidates {
            match self.process_candidate(&keyword, candidate).await {
                CandidateOutcome::Created(article) => {
                    created += 1;
                    articles.push(article);
                }
                CandidateOutcome::ReusedExisting(article) => {
                    reused += 1;
                    articles.push(article);
                }
                CandidateOutcome::Skipped(reason) => {
                    debug!(title = %candidate.title, ?reason, "Skipped candidate");
                }
            }
        }

        info!(keyword, created, reused, total = articles.len(), "Resolve completed");

        Ok(SearchOutcome {
            articles,
            served_from_cache: false,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Re-run enrichment for a single stored article, overwriting its
    /// analysis. Unlike the ingestion path, an enrichment failure here
    /// is surfaced rather than replaced by the fallback.
    pub async fn reprocess(&self, id: &str) -> Result<Option<Article>, ResolveError> {
        let Some(article) = self.store.find_by_id(id).await? else {
            return Ok(None);
        };

        let enrichment = self.enricher.enrich(&article.content).await?;
        let analysis = crate::articles::models::AiAnalysis {
            summary: enrichment.summary,
            sentiment: enrichment.sentiment,
            processed_at: chrono::Utc::now(),
        };
        self.store.update_analysis(id, &analysis).await?;

        Ok(self.store.find_by_id(id).await?)
    }

    async fn process_candidate(&self, keyword: &str, candidate: &NewsCandidate) -> CandidateOutcome {
        let url = match candidate.url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) => url.to_string(),
            None => return CandidateOutcome::Skipped(SkipReason::MissingUrl),
        };

        match self.store.find_by_url(&url).await {
            Ok(Some(existing)) => return CandidateOutcome::ReusedExisting(existing),
            Ok(None) => {}
            Err(e) => {
                warn!(url, error = %e, "Dedup lookup failed, skipping candidate");
                return CandidateOutcome::Skipped(SkipReason::StoreError);
            }
        }

        let content = self.resolve_content(candidate, &url).await;
        if content.chars().count() < MIN_CONTENT_CHARS {
            return CandidateOutcome::Skipped(SkipReason::ContentTooShort);
        }

        let Enrichment { summary, sentiment } = match self.enricher.enrich(&content).await {
            Ok(enrichment) => enrichment,
            Err(e) => {
                warn!(url, error = %e, "Enrichment failed, using fallback");
                fallback_enrichment(&content)
            }
        };

        let article = Article::assemble(keyword, candidate, url.clone(), content, summary, sentiment);

        match self.store.create_if_absent(&article).await {
            Ok((stored, true)) => CandidateOutcome::Created(stored),
            // Lost an insert race to a concurrent resolve.
            Ok((winner, false)) => CandidateOutcome::ReusedExisting(winner),
            Err(e) => {
                warn!(url, error = %e, "Failed to persist article, skipping candidate");
                CandidateOutcome::Skipped(SkipReason::StoreError)
            }
        }
    }

    /// Pick the candidate's own text, fetching the article page when it
    /// is too thin. Page fetch failures keep the thin text.
    async fn resolve_content(&self, candidate: &NewsCandidate, url: &str) -> String {
        let initial = candidate
            .content
            .clone()
            .or_else(|| candidate.description.clone())
            .unwrap_or_default();

        if initial.chars().count() >= SCRAPE_THRESHOLD_CHARS {
            return initial;
        }

        match self.fetcher.fetch(url).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => initial,
            Err(e) => {
                debug!(url, error = %e, "Page fetch failed, keeping candidate text");
                initial
            }
        }
    }
}

/// Trim, lowercase, and validate a raw search keyword.
fn normalize_keyword(raw: &str) -> Result<String, ResolveError> {
    let keyword = raw.trim().to_lowercase();
    if keyword.is_empty() {
        return Err(ResolveError::InvalidKeyword("keyword is empty".to_string()));
    }
    if keyword.chars().count() > MAX_KEYWORD_CHARS {
        return Err(ResolveError::InvalidKeyword(format!(
            "keyword exceeds {MAX_KEYWORD_CHARS} characters"
        )));
    }
    Ok(keyword)
}
