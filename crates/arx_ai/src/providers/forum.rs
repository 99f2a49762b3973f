use std::time::Duration;

use arx_core::domain::{EvidenceRecord, SourceKind};
use arx_core::error::AppError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{http_error, truncate_chars, unavailable, EvidenceProvider, MAX_CONTENT_CHARS};

pub const DEFAULT_AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const DEFAULT_API_URL: &str = "https://oauth.reddit.com";
const NAME: &str = "forum";
const MIN_CONTENT_CHARS: usize = 50;

#[derive(Debug, Clone)]
pub struct ForumCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Reddit search across a fixed list of subreddits, using an application-only token.
#[derive(Debug, Clone)]
pub struct ForumProvider {
    credentials: Option<ForumCredentials>,
    user_agent: String,
    subreddits: Vec<String>,
    auth_url: String,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    #[serde(default)]
    selftext: String,
    permalink: String,
    #[serde(default)]
    created_utc: f64,
}

impl ForumProvider {
    pub fn new(
        credentials: Option<ForumCredentials>,
        user_agent: impl Into<String>,
        subreddits: Vec<String>,
    ) -> Self {
        Self {
            credentials: credentials
                .filter(|c| !c.client_id.is_empty() && !c.client_secret.is_empty()),
            user_agent: user_agent.into(),
            subreddits,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_endpoints(
        mut self,
        auth_url: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        self.auth_url = auth_url.into();
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn access_token(&self, creds: &ForumCredentials) -> Result<String, AppError> {
        let basic = STANDARD.encode(format!("{}:{}", creds.client_id, creds.client_secret));
        let resp = ureq::post(&self.auth_url)
            .timeout(Duration::from_secs(10))
            .set("User-Agent", &self.user_agent)
            .set("Authorization", &format!("Basic {basic}"))
            .send_form(&[("grant_type", "client_credentials")])
            .map_err(|e| http_error(NAME, "Forum token request", e))?;
        let token: TokenResponse = resp.into_json().map_err(|e| {
            unavailable(NAME, "Failed to decode forum token response").with_details(e.to_string())
        })?;
        Ok(token.access_token)
    }

    fn search_subreddit(
        &self,
        token: &str,
        subreddit: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Post>, AppError> {
        let url = format!("{}/r/{}/search", self.api_url, subreddit);
        let resp = ureq::get(&url)
            .timeout(Duration::from_secs(10))
            .set("User-Agent", &self.user_agent)
            .set("Authorization", &format!("Bearer {token}"))
            .query("q", query)
            .query("restrict_sr", "1")
            .query("sort", "relevance")
            .query("limit", &limit.to_string())
            .call()
            .map_err(|e| http_error(NAME, "Forum search", e))?;
        let listing: Listing = resp.into_json().map_err(|e| {
            unavailable(NAME, "Failed to decode forum listing").with_details(e.to_string())
        })?;
        Ok(listing.data.children.into_iter().map(|c| c.data).collect())
    }
}

/// Per-subreddit request size. Always asks for at least one post.
fn per_subreddit_limit(max_results: usize, subreddits: usize) -> usize {
    (max_results / subreddits.max(1)).max(1)
}

fn record_from_post(post: Post) -> Option<EvidenceRecord> {
    let content = if post.selftext.trim().is_empty() {
        post.title.clone()
    } else {
        post.selftext
    };
    if content.chars().count() < MIN_CONTENT_CHARS {
        return None;
    }
    Some(EvidenceRecord::new(
        format!("https://reddit.com{}", post.permalink),
        post.title,
        truncate_chars(&content, MAX_CONTENT_CHARS),
        SourceKind::Forum,
        post.created_utc.to_string(),
    ))
}

impl EvidenceProvider for ForumProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn search_evidence(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<EvidenceRecord>, AppError> {
        let Some(creds) = self.credentials.as_ref() else {
            return Err(unavailable(NAME, "Forum credentials are not configured"));
        };
        if self.subreddits.is_empty() || max_results == 0 {
            return Ok(Vec::new());
        }

        let token = self.access_token(creds)?;
        let limit = per_subreddit_limit(max_results, self.subreddits.len());
        let mut out = Vec::new();
        let mut failures = 0usize;
        let mut last_error: Option<AppError> = None;
        for subreddit in &self.subreddits {
            if out.len() >= max_results {
                break;
            }
            let posts = match self.search_subreddit(&token, subreddit, query, limit) {
                Ok(posts) => posts,
                Err(e) => {
                    warn!(subreddit = %subreddit, error = %e, "skipping subreddit");
                    failures += 1;
                    last_error = Some(e);
                    continue;
                }
            };
            debug!(subreddit = %subreddit, posts = posts.len(), "forum search page");
            out.extend(
                posts
                    .into_iter()
                    .filter_map(record_from_post)
                    .take(max_results - out.len()),
            );
        }

        match last_error {
            Some(e) if failures == self.subreddits.len() => Err(e),
            _ => Ok(out),
        }
    }
}
