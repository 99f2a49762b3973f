use std::time::Duration;

use arx_core::domain::{EvidenceRecord, SourceKind};
use arx_core::error::AppError;
use serde::Deserialize;

use super::{http_error, truncate_chars, unavailable, EvidenceProvider, MAX_CONTENT_CHARS};

pub const DEFAULT_NEWS_API_URL: &str = "https://newsapi.org/v2";
const NAME: &str = "news";

/// NewsAPI `/everything` search.
#[derive(Debug, Clone)]
pub struct NewsProvider {
    api_key: Option<String>,
    language: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    url: Option<String>,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

impl NewsProvider {
    pub fn new(api_key: Option<String>, language: impl Into<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            language: language.into(),
            base_url: DEFAULT_NEWS_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

fn records_from_articles(articles: Vec<Article>, max_results: usize) -> Vec<EvidenceRecord> {
    articles
        .into_iter()
        .filter_map(|a| {
            let url = a.url.filter(|u| !u.is_empty())?;
            let title = a.title.filter(|t| !t.is_empty())?;
            let body = a
                .content
                .filter(|c| !c.trim().is_empty())
                .or(a.description)
                .unwrap_or_default();
            Some(EvidenceRecord::new(
                url,
                title,
                truncate_chars(&body, MAX_CONTENT_CHARS),
                SourceKind::News,
                a.published_at.unwrap_or_default(),
            ))
        })
        .take(max_results)
        .collect()
}

impl EvidenceProvider for NewsProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn search_evidence(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<EvidenceRecord>, AppError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(unavailable(NAME, "News API key is not configured"));
        };

        let url = format!("{}/everything", self.base_url);
        let resp = ureq::get(&url)
            .timeout(Duration::from_secs(15))
            .query("q", query)
            .query("apiKey", api_key)
            .query("language", &self.language)
            .query("sortBy", "relevancy")
            .query("pageSize", &max_results.to_string())
            .call()
            .map_err(|e| http_error(NAME, "News search", e))?;

        let body: EverythingResponse = resp.into_json().map_err(|e| {
            unavailable(NAME, "Failed to decode news response").with_details(e.to_string())
        })?;
        Ok(records_from_articles(body.articles, max_results))
    }
}
