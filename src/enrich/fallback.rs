//! Deterministic fallback used when the enrichment service fails.
//!
//! The result has the same shape as a real enrichment so downstream
//! consumers never need to distinguish the two.

use crate::articles::models::{Sentiment, SentimentLabel};
use crate::enrich::Enrichment;

const FALLBACK_SUMMARY_CHARS: usize = 200;
const FALLBACK_CONFIDENCE: f64 = 0.5;
const FALLBACK_SCORE: f64 = 0.0;

/// Build a neutral enrichment from the raw text alone.
pub fn fallback_enrichment(text: &str) -> Enrichment {
    let summary = format!("{}...", truncate_chars(text, FALLBACK_SUMMARY_CHARS));

    Enrichment {
        summary,
        sentiment: Sentiment {
            label: SentimentLabel::Neutral,
            confidence: FALLBACK_CONFIDENCE,
            score: FALLBACK_SCORE,
        },
    }
}

/// Truncate to at most `max_chars` characters without splitting a
/// UTF-8 code point.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_shape() {
        let result = fallback_enrichment("Some article text.");
        assert_eq!(result.summary, "Some article text....");
        assert_eq!(result.sentiment.label, SentimentLabel::Neutral);
        assert_eq!(result.sentiment.confidence, 0.5);
        assert_eq!(result.sentiment.score, 0.0);
    }

    #[test]
    fn test_fallback_truncates_long_text() {
        let text = "a".repeat(500);
        let result = fallback_enrichment(&text);
        assert_eq!(result.summary.chars().count(), 203);
        assert!(result.summary.ends_with("..."));
    }

    #[test]
    fn test_truncate_respects_utf8_boundaries() {
        let text = "é".repeat(300);
        let truncated = truncate_chars(&text, 200);
        assert_eq!(truncated.chars().count(), 200);
    }
}
