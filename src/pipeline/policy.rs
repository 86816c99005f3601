//! Freshness policy for the keyword cache gate.

use serde::Deserialize;

/// Decides when stored articles are fresh enough to answer a search
/// without touching the external source.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FreshnessPolicy {
    /// Trailing window (hours) in which an article counts as fresh.
    pub cache_window_hours: u32,
    /// Minimum fresh articles required to serve from cache.
    pub cache_min_articles: u32,
    /// Cap on articles returned per search, cached or fetched.
    pub cache_max_articles: u32,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            cache_window_hours: 24,
            cache_min_articles: 5,
            cache_max_articles: 10,
        }
    }
}

impl FreshnessPolicy {
    /// True when `count` fresh articles are enough to skip the fetch.
    pub fn satisfied_by(&self, count: usize) -> bool {
        count >= self.cache_min_articles as usize
    }
}
