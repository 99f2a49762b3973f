use std::sync::LazyLock;
use std::time::Duration;

use arx_core::domain::{EvidenceRecord, SourceKind};
use arx_core::error::AppError;
use quick_xml::events::Event;
use regex::Regex;
use tracing::warn;

use super::{http_error, truncate_chars, unavailable, EvidenceProvider, MAX_CONTENT_CHARS};

const NAME: &str = "blog";
const MIN_TERM_CHARS: usize = 3;

static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("markup regex"));

/// RSS feeds filtered by query terms.
#[derive(Debug, Clone)]
pub struct BlogProvider {
    feeds: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
    PubDate,
}

impl Field {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"description" => Some(Field::Description),
            b"pubDate" => Some(Field::PubDate),
            _ => None,
        }
    }
}

fn push_text(item: &mut FeedItem, field: Field, text: &str) {
    let slot = match field {
        Field::Title => &mut item.title,
        Field::Link => &mut item.link,
        Field::Description => &mut item.description,
        Field::PubDate => &mut item.pub_date,
    };
    slot.push_str(text);
}

/// `<item>` entries of an RSS 2.0 document. Text and CDATA are both accepted.
pub fn parse_rss(xml: &str) -> Result<Vec<FeedItem>, AppError> {
    let mut reader = quick_xml::Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut items = Vec::new();
    let mut current: Option<FeedItem> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"item" {
                    current = Some(FeedItem::default());
                } else if current.is_some() {
                    field = Field::from_tag(name.as_ref());
                }
            }
            Ok(Event::Text(te)) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    let text = te.unescape().unwrap_or_default();
                    push_text(item, f, &text);
                }
            }
            Ok(Event::CData(c)) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    push_text(item, f, &String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"item" {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                }
                field = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(unavailable(NAME, "Failed to parse feed").with_details(e.to_string()))
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(items)
}

fn query_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() >= MIN_TERM_CHARS)
        .collect()
}

fn mentions_any(item: &FeedItem, terms: &[String]) -> bool {
    let haystack = format!("{} {}", item.title, item.description).to_lowercase();
    terms.iter().any(|t| haystack.contains(t.as_str()))
}

fn plain_text(html: &str) -> String {
    MARKUP
        .replace_all(html, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Items mentioning any query term, in feed order, as blog records.
pub fn matching_records(
    items: Vec<FeedItem>,
    query: &str,
    max_results: usize,
) -> Vec<EvidenceRecord> {
    let terms = query_terms(query);
    if terms.is_empty() {
        return Vec::new();
    }
    items
        .into_iter()
        .filter(|item| !item.link.is_empty() && mentions_any(item, &terms))
        .take(max_results)
        .map(|item| {
            let body = plain_text(&item.description);
            EvidenceRecord::new(
                item.link,
                item.title,
                truncate_chars(&body, MAX_CONTENT_CHARS),
                SourceKind::Blog,
                item.pub_date,
            )
        })
        .collect()
}

impl BlogProvider {
    pub fn new(feeds: Vec<String>) -> Self {
        Self { feeds }
    }

    fn fetch(&self, feed: &str) -> Result<Vec<FeedItem>, AppError> {
        let body = ureq::get(feed)
            .timeout(Duration::from_secs(10))
            .call()
            .map_err(|e| http_error(NAME, "Feed fetch", e))?
            .into_string()
            .map_err(|e| {
                unavailable(NAME, "Failed to read feed body")
                    .with_details(format!("feed={feed}; err={e}"))
            })?;
        parse_rss(&body)
    }
}

impl EvidenceProvider for BlogProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn search_evidence(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<EvidenceRecord>, AppError> {
        if self.feeds.is_empty() {
            return Err(unavailable(NAME, "No blog feeds are configured"));
        }

        let mut out = Vec::new();
        let mut failures = 0usize;
        let mut last_error: Option<AppError> = None;
        for feed in &self.feeds {
            if out.len() >= max_results {
                break;
            }
            match self.fetch(feed) {
                Ok(items) => {
                    out.extend(matching_records(items, query, max_results - out.len()));
                }
                Err(e) => {
                    warn!(feed = %feed, error = %e, "skipping blog feed");
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if failures == self.feeds.len() => Err(e),
            _ => Ok(out),
        }
    }
}
