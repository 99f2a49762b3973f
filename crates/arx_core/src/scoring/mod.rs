//! Argument quality scoring.
//!
//! Rule-based metrics are always computed. When an external scorer is configured its assessment
//! is parsed and blended in with fixed weights; any call failure degrades to the rule-based
//! metrics unchanged.

use tracing::{debug, warn};

use crate::domain::{Argument, EvaluationMetrics};
use crate::error::AppError;

pub mod heuristics;
mod parse;

pub use heuristics::rule_based_evaluation;
pub use parse::{parse_external_assessment, MISSING_FEEDBACK, PARSE_FAILED_FEEDBACK};

pub const RULE_WEIGHT: f64 = 0.4;
pub const EXTERNAL_WEIGHT: f64 = 0.6;

/// A model-backed assessor. Returns raw text expected to carry four labelled scores and a
/// trailing `Feedback:` section.
pub trait ExternalScorer: Send + Sync {
    fn assess(&self, content: &str, citations: &[String]) -> Result<String, AppError>;
}

/// Fixed-weight convex combination, applied per sub-score. Feedback comes from `external`.
pub fn blend(rule_based: &EvaluationMetrics, external: &EvaluationMetrics) -> EvaluationMetrics {
    let r = rule_based.sub_scores();
    let x = external.sub_scores();
    let mix = |i: usize| RULE_WEIGHT * r[i] + EXTERNAL_WEIGHT * x[i];
    EvaluationMetrics::new(mix(0), mix(1), mix(2), mix(3), external.feedback())
}

pub struct ArgumentScorer {
    external: Option<Box<dyn ExternalScorer>>,
}

impl ArgumentScorer {
    pub fn rule_based() -> Self {
        Self { external: None }
    }

    pub fn with_external(external: Box<dyn ExternalScorer>) -> Self {
        Self {
            external: Some(external),
        }
    }

    pub fn has_external(&self) -> bool {
        self.external.is_some()
    }

    pub fn evaluate(&self, argument: &Argument) -> EvaluationMetrics {
        let rule_based = rule_based_evaluation(argument);
        let Some(external) = self.external.as_deref() else {
            return rule_based;
        };

        match external.assess(&argument.content, &argument.citations) {
            Ok(raw) => {
                let assessed = parse_external_assessment(&raw);
                debug!(
                    stance = argument.stance.as_str(),
                    rule_overall = rule_based.overall(),
                    external_overall = assessed.overall(),
                    "blending external assessment"
                );
                blend(&rule_based, &assessed)
            }
            Err(e) => {
                warn!(
                    stance = argument.stance.as_str(),
                    code = %e.code,
                    error = %e,
                    "external scoring failed; using rule-based metrics"
                );
                rule_based
            }
        }
    }
}

impl Default for ArgumentScorer {
    fn default() -> Self {
        Self::rule_based()
    }
}
