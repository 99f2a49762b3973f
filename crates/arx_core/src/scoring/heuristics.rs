//! Deterministic text heuristics behind the rule-based sub-scores.
//!
//! Each sub-score starts from a base and folds a fixed list of bonuses over the text. Points are
//! kept in hundredths so that bonuses add exactly; the running total is capped at 100.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{Argument, EvaluationMetrics};

type Points = u32;

const FULL: Points = 100;

pub const FEEDBACK_THRESHOLD: f64 = 0.6;

const TRANSITION_WORDS: &[&str] = &[
    "however",
    "furthermore",
    "moreover",
    "therefore",
    "consequently",
    "additionally",
];

const LOGICAL_CONNECTIVES: &[&str] = &[
    "because",
    "since",
    "therefore",
    "thus",
    "consequently",
    "as a result",
];

const EVIDENCE_PHRASES: &[&str] = &["according to", "research shows"];

const PERSUASIVE_WORDS: &[&str] = &[
    "significant",
    "crucial",
    "essential",
    "important",
    "compelling",
    "overwhelming",
];

const RHETORICAL_PATTERNS: &[&str] = &["why should", "imagine if", "consider this"];

const CLARITY_FEEDBACK: &str =
    "Consider improving clarity with shorter sentences and clearer transitions.";
const LOGIC_FEEDBACK: &str = "Strengthen logical flow with more explicit reasoning connections.";
const EVIDENCE_FEEDBACK: &str = "Add more citations and specific evidence to support claims.";
const PERSUASIVENESS_FEEDBACK: &str =
    "Enhance persuasiveness with stronger language and rhetorical techniques.";
const BALANCED_FEEDBACK: &str = "Strong argument with good balance across all criteria.";

static ORDINAL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(first|second|third|finally)\b").expect("ordinal marker pattern")
});

static NUMERIC_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+(?:\.\d+)?%?\b").expect("numeric token pattern"));

enum Bonus {
    /// Flat bonus when the condition holds.
    Flag(bool, Points),
    /// `per_hit` for every hit, capped at `cap`.
    Scaled { hits: u32, per_hit: Points, cap: Points },
}

impl Bonus {
    fn points(&self) -> Points {
        match *self {
            Bonus::Flag(hit, bonus) => {
                if hit {
                    bonus
                } else {
                    0
                }
            }
            Bonus::Scaled { hits, per_hit, cap } => hits.saturating_mul(per_hit).min(cap),
        }
    }
}

fn fold(base: Points, bonuses: &[Bonus]) -> f64 {
    let total = bonuses
        .iter()
        .fold(base, |acc, b| acc.saturating_add(b.points()).min(FULL));
    f64::from(total) / f64::from(FULL)
}

/// Number of lexicon entries that occur in `lower` (entries, not occurrences).
fn lexicon_hits(lower: &str, lexicon: &[&str]) -> u32 {
    lexicon.iter().filter(|w| lower.contains(*w)).count() as u32
}

fn contains_any(lower: &str, lexicon: &[&str]) -> bool {
    lexicon.iter().any(|w| lower.contains(w))
}

/// Mean whitespace-token count over `.`-separated pieces (trailing empty piece included).
fn average_sentence_length(content: &str) -> f64 {
    let mut pieces = 0usize;
    let mut tokens = 0usize;
    for piece in content.split('.') {
        pieces += 1;
        tokens += piece.split_whitespace().count();
    }
    tokens as f64 / pieces.max(1) as f64
}

pub fn clarity(content: &str) -> f64 {
    let lower = content.to_lowercase();
    let avg = average_sentence_length(content);
    fold(
        50,
        &[
            Bonus::Flag((10.0..=25.0).contains(&avg), 20),
            Bonus::Flag(contains_any(&lower, TRANSITION_WORDS), 20),
            Bonus::Flag(content.contains(','), 10),
        ],
    )
}

pub fn logic(content: &str) -> f64 {
    let lower = content.to_lowercase();
    fold(
        40,
        &[
            Bonus::Scaled {
                hits: lexicon_hits(&lower, LOGICAL_CONNECTIVES),
                per_hit: 10,
                cap: 40,
            },
            Bonus::Flag(ORDINAL_MARKER.is_match(content), 20),
        ],
    )
}

pub fn evidence_use(content: &str, citation_count: usize) -> f64 {
    let lower = content.to_lowercase();
    fold(
        30,
        &[
            Bonus::Scaled {
                hits: u32::try_from(citation_count).unwrap_or(u32::MAX),
                per_hit: 15,
                cap: 40,
            },
            Bonus::Flag(contains_any(&lower, EVIDENCE_PHRASES), 20),
            Bonus::Flag(NUMERIC_TOKEN.is_match(content), 10),
        ],
    )
}

pub fn persuasiveness(content: &str) -> f64 {
    let lower = content.to_lowercase();
    fold(
        40,
        &[
            Bonus::Scaled {
                hits: lexicon_hits(&lower, PERSUASIVE_WORDS),
                per_hit: 5,
                cap: 30,
            },
            Bonus::Flag(content.contains('!'), 10),
            Bonus::Flag(contains_any(&lower, RHETORICAL_PATTERNS), 20),
        ],
    )
}

/// Improvement sentences for every dimension under the threshold, in dimension order.
pub fn feedback_for(clarity: f64, logic: f64, evidence_use: f64, persuasiveness: f64) -> String {
    let parts: Vec<&str> = [
        (clarity, CLARITY_FEEDBACK),
        (logic, LOGIC_FEEDBACK),
        (evidence_use, EVIDENCE_FEEDBACK),
        (persuasiveness, PERSUASIVENESS_FEEDBACK),
    ]
    .into_iter()
    .filter(|(score, _)| *score < FEEDBACK_THRESHOLD)
    .map(|(_, sentence)| sentence)
    .collect();

    if parts.is_empty() {
        BALANCED_FEEDBACK.to_string()
    } else {
        parts.join(" ")
    }
}

/// Rule-based metrics for an argument. Pure; never calls a model.
pub fn rule_based_evaluation(argument: &Argument) -> EvaluationMetrics {
    let content = argument.content.as_str();
    let c = clarity(content);
    let l = logic(content);
    let e = evidence_use(content, argument.citations.len());
    let p = persuasiveness(content);
    EvaluationMetrics::new(c, l, e, p, feedback_for(c, l, e, p))
}
