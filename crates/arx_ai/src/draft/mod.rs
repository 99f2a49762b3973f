use arx_core::domain::{Argument, EvidenceRecord, Stance};
use tracing::{info, warn};

use crate::llm::Llm;

pub(crate) mod prompts;

pub const DRAFT_CONFIDENCE: f64 = 0.8;
const SOURCE_PREVIEW_CHARS: usize = 300;

/// Drafts one argument per stance from the leading retrieved sources.
pub struct ArgumentGenerator {
    llm: Box<dyn Llm>,
    model: String,
    max_sources: usize,
    max_words: usize,
}

impl ArgumentGenerator {
    pub fn new(llm: Box<dyn Llm>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            max_sources: 5,
            max_words: 500,
        }
    }

    pub fn with_limits(mut self, max_sources: usize, max_words: usize) -> Self {
        self.max_sources = max_sources;
        self.max_words = max_words;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Pro then con, over the same `max_sources` leading records.
    pub fn generate_pro_con(
        &self,
        topic: &str,
        evidence: &[EvidenceRecord],
    ) -> (Argument, Argument) {
        let used = &evidence[..evidence.len().min(self.max_sources)];
        (
            self.generate(topic, used, Stance::Pro),
            self.generate(topic, used, Stance::Con),
        )
    }

    /// Never fails: a model error yields a zero-confidence placeholder for `stance`.
    pub fn generate(&self, topic: &str, sources: &[EvidenceRecord], stance: Stance) -> Argument {
        let prompt = prompts::stance_prompt(topic, stance, &source_blocks(sources), self.max_words);
        match self.llm.generate(&self.model, &prompt) {
            Ok(text) => {
                let content = text.trim().to_string();
                let citations = extract_citations(&content, sources);
                info!(
                    stance = stance.as_str(),
                    citations = citations.len(),
                    "argument drafted"
                );
                Argument {
                    stance,
                    content,
                    sources: sources.to_vec(),
                    citations,
                    confidence_score: DRAFT_CONFIDENCE,
                }
            }
            Err(e) => {
                warn!(
                    stance = stance.as_str(),
                    code = %e.code,
                    error = %e,
                    "argument generation failed; using placeholder"
                );
                placeholder(stance, sources)
            }
        }
    }
}

pub fn placeholder(stance: Stance, sources: &[EvidenceRecord]) -> Argument {
    Argument {
        stance,
        content: format!(
            "Unable to generate {} argument due to API error.",
            stance.as_str()
        ),
        sources: sources.to_vec(),
        citations: Vec::new(),
        confidence_score: 0.0,
    }
}

fn source_blocks(sources: &[EvidenceRecord]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let head: String = s.content.chars().take(SOURCE_PREVIEW_CHARS).collect();
            format!("Source {}: {}\n{}...\nURL: {}\n", i + 1, s.title, head, s.url)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `"[i] title - url"` for every source referenced by label or by the first word of its title.
pub fn extract_citations(text: &str, sources: &[EvidenceRecord]) -> Vec<String> {
    sources
        .iter()
        .enumerate()
        .filter(|(i, s)| {
            let by_label = text.contains(&format!("Source {}", i + 1));
            let by_title = s
                .title
                .split_whitespace()
                .next()
                .is_some_and(|word| text.contains(word));
            by_label || by_title
        })
        .map(|(i, s)| format!("[{}] {} - {}", i + 1, s.title, s.url))
        .collect()
}
