//! Evidence acquisition.
//!
//! Each provider turns a query into [`EvidenceRecord`]s from one upstream source. The
//! [`EvidenceAggregator`] calls them in a fixed priority order, treats any provider error as an
//! empty contribution, and falls back to a two-record synthetic corpus when nothing came back.

use arx_core::domain::{EvidenceRecord, SourceKind};
use arx_core::error::{codes, AppError};
use tracing::{info, warn};

pub mod blog;
pub mod forum;
pub mod news;

pub use blog::BlogProvider;
pub use forum::ForumProvider;
pub use news::NewsProvider;

/// Upper bound on stored content per record, in characters.
pub const MAX_CONTENT_CHARS: usize = 1000;

const SYNTHETIC_PUBLISHED_AT: &str = "2024-01-01";

pub trait EvidenceProvider: Send + Sync {
    fn name(&self) -> &str;

    fn search_evidence(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<EvidenceRecord>, AppError>;
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

pub(crate) fn unavailable(provider: &str, message: impl Into<String>) -> AppError {
    AppError::new(codes::PROVIDER_UNAVAILABLE, message).with_details(format!("provider={provider}"))
}

/// Maps a ureq failure onto `ARX_PROVIDER_UNAVAILABLE`, keeping the status when there is one.
pub(crate) fn http_error(provider: &str, what: &str, err: ureq::Error) -> AppError {
    match err {
        ureq::Error::Status(status, _) => {
            AppError::new(codes::PROVIDER_UNAVAILABLE, format!("{what} was rejected"))
                .with_details(format!("provider={provider}; status={status}"))
        }
        other => AppError::new(codes::PROVIDER_UNAVAILABLE, format!("{what} failed"))
            .with_details(format!("provider={provider}; err={other}"))
            .with_retryable(true),
    }
}

/// The fixed placeholder corpus used when every provider came back empty.
pub fn synthetic_fallback(query: &str) -> Vec<EvidenceRecord> {
    vec![
        EvidenceRecord::new(
            "urn:argumentrx:synthetic:1",
            format!("Analysis of {query} trends and implications"),
            format!(
                "Recent analysis shows that {query} presents both opportunities and challenges. \
                 Market experts suggest careful consideration of various factors including \
                 regulatory frameworks, technological developments, and market dynamics."
            ),
            SourceKind::Synthetic,
            SYNTHETIC_PUBLISHED_AT,
        ),
        EvidenceRecord::new(
            "urn:argumentrx:synthetic:2",
            format!("Expert opinions on {query} future outlook"),
            format!(
                "Industry experts have mixed views on {query}. Some believe it represents \
                 significant innovation potential, while others express concerns about \
                 volatility and regulatory uncertainty. Long-term implications remain to be seen."
            ),
            SourceKind::Synthetic,
            SYNTHETIC_PUBLISHED_AT,
        ),
    ]
}

pub struct EvidenceAggregator {
    providers: Vec<Box<dyn EvidenceProvider>>,
}

impl EvidenceAggregator {
    /// `providers` is the priority order; output is concatenated in this order.
    pub fn new(providers: Vec<Box<dyn EvidenceProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Never fails and never returns an empty corpus.
    pub fn collect(&self, query: &str, per_provider_limit: usize) -> Vec<EvidenceRecord> {
        let mut out: Vec<EvidenceRecord> = Vec::new();
        for provider in &self.providers {
            match provider.search_evidence(query, per_provider_limit) {
                Ok(mut records) => {
                    records.truncate(per_provider_limit);
                    info!(
                        provider = provider.name(),
                        count = records.len(),
                        "provider returned evidence"
                    );
                    out.extend(records);
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        code = %e.code,
                        error = %e,
                        "provider failed; contributing no evidence"
                    );
                }
            }
        }

        if out.is_empty() {
            warn!(query, "no provider evidence; using synthetic fallback corpus");
            return synthetic_fallback(query);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn synthetic_fallback_mentions_query() {
        let records = synthetic_fallback("staking");
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.kind == SourceKind::Synthetic));
        assert!(records.iter().all(|r| r.content.contains("staking")));
        assert!(records.iter().all(|r| r.relevance_score() == 0.0));
    }
}
