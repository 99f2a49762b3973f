use std::sync::LazyLock;

use regex::Regex;

use crate::domain::EvaluationMetrics;

pub const PARSE_FAILED_FEEDBACK: &str = "Evaluation parsing failed";
pub const MISSING_FEEDBACK: &str = "No feedback available";

const DEFAULT_SCORE: f64 = 0.5;

static CLARITY: LazyLock<Regex> = LazyLock::new(|| label_pattern("clarity"));
static LOGIC: LazyLock<Regex> = LazyLock::new(|| label_pattern("logic"));
static EVIDENCE: LazyLock<Regex> = LazyLock::new(|| label_pattern("evidence"));
static PERSUASIVENESS: LazyLock<Regex> = LazyLock::new(|| label_pattern("persuasiveness"));
static FEEDBACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\bfeedback\s*:\s*(.+)").expect("feedback pattern"));

fn label_pattern(label: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{label}\s*:\s*(\d+\.?\d*)")).expect("score label pattern")
}

/// Extract a labelled score.
///
/// `None` when the label is absent; `Some(None)` when present but unusable.
fn labelled_score(re: &Regex, raw: &str) -> Option<Option<f64>> {
    let caps = re.captures(raw)?;
    let value = caps
        .get(1)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0));
    Some(value)
}

/// Parse a free-text assessment of the form `Clarity: 0.8 ... Feedback: ...`.
///
/// Missing or unusable fields default to 0.5. When nothing recognisable is found at all the
/// result is all-0.5 with [`PARSE_FAILED_FEEDBACK`].
pub fn parse_external_assessment(raw: &str) -> EvaluationMetrics {
    let scores = [
        labelled_score(&CLARITY, raw),
        labelled_score(&LOGIC, raw),
        labelled_score(&EVIDENCE, raw),
        labelled_score(&PERSUASIVENESS, raw),
    ];
    let feedback = FEEDBACK
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());

    if scores.iter().all(Option::is_none) && feedback.is_none() {
        return EvaluationMetrics::new(
            DEFAULT_SCORE,
            DEFAULT_SCORE,
            DEFAULT_SCORE,
            DEFAULT_SCORE,
            PARSE_FAILED_FEEDBACK,
        );
    }

    let [c, l, e, p] = scores.map(|s| s.flatten().unwrap_or(DEFAULT_SCORE));
    EvaluationMetrics::new(
        c,
        l,
        e,
        p,
        feedback.unwrap_or_else(|| MISSING_FEEDBACK.to_string()),
    )
}
