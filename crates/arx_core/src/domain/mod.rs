use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    News,
    Forum,
    Blog,
    Synthetic,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::News => "news",
            SourceKind::Forum => "forum",
            SourceKind::Blog => "blog",
            SourceKind::Synthetic => "synthetic",
        }
    }
}

/// One retrieved evidence snippet plus its source metadata.
///
/// Notes:
/// - `content` is pre-truncated by the provider that produced the record.
/// - `relevance_score` starts at 0 and is only ever assigned by the similarity index at query
///   time, via [`EvidenceRecord::with_relevance`] on a copy of the stored record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvidenceRecord {
    pub url: String,
    pub title: String,
    pub content: String,
    pub kind: SourceKind,
    pub published_at: String,
    #[serde(default)]
    relevance_score: f32,
}

impl EvidenceRecord {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        kind: SourceKind,
        published_at: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            content: content.into(),
            kind,
            published_at: published_at.into(),
            relevance_score: 0.0,
        }
    }

    pub fn relevance_score(&self) -> f32 {
        self.relevance_score
    }

    /// Copy of this record carrying a query-time similarity score.
    ///
    /// Only `SimilarityIndex::search` should call this; providers and reports leave the score
    /// as they received it.
    pub fn with_relevance(&self, score: f32) -> Self {
        Self {
            relevance_score: score,
            ..self.clone()
        }
    }

    /// Text fed to the embedding model for this record.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Pro,
    Con,
}

impl Stance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Pro => "pro",
            Stance::Con => "con",
        }
    }
}

/// A generated stance argument. Built once per stance per request and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Argument {
    pub stance: Stance,
    pub content: String,
    pub sources: Vec<EvidenceRecord>,
    pub citations: Vec<String>,
    pub confidence_score: f64,
}

/// Four-dimension quality assessment of an argument.
///
/// `overall` is computed by the constructor as the arithmetic mean of the four sub-scores, so it
/// cannot drift from them.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EvaluationMetrics {
    clarity: f64,
    logic: f64,
    evidence_use: f64,
    persuasiveness: f64,
    overall: f64,
    feedback: String,
}

impl EvaluationMetrics {
    pub fn new(
        clarity: f64,
        logic: f64,
        evidence_use: f64,
        persuasiveness: f64,
        feedback: impl Into<String>,
    ) -> Self {
        let overall = (clarity + logic + evidence_use + persuasiveness) / 4.0;
        Self {
            clarity,
            logic,
            evidence_use,
            persuasiveness,
            overall,
            feedback: feedback.into(),
        }
    }

    pub fn clarity(&self) -> f64 {
        self.clarity
    }

    pub fn logic(&self) -> f64 {
        self.logic
    }

    pub fn evidence_use(&self) -> f64 {
        self.evidence_use
    }

    pub fn persuasiveness(&self) -> f64 {
        self.persuasiveness
    }

    pub fn overall(&self) -> f64 {
        self.overall
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    /// Sub-scores in the fixed dimension order: clarity, logic, evidence use, persuasiveness.
    pub fn sub_scores(&self) -> [f64; 4] {
        [self.clarity, self.logic, self.evidence_use, self.persuasiveness]
    }
}
