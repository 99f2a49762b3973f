//! Model-backed external assessment for the argument scorer.

use arx_core::error::{codes, AppError};
use arx_core::scoring::ExternalScorer;

use crate::draft::prompts::evaluation_prompt;
use crate::llm::Llm;

/// Asks a language model to rate an argument; returns the raw answer for the scorer to parse.
pub struct LlmJudge {
    llm: Box<dyn Llm>,
    model: String,
}

impl LlmJudge {
    pub fn new(llm: Box<dyn Llm>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }
}

impl ExternalScorer for LlmJudge {
    fn assess(&self, content: &str, citations: &[String]) -> Result<String, AppError> {
        let prompt = evaluation_prompt(content, citations);
        self.llm.generate(&self.model, &prompt).map_err(|e| {
            AppError::new(codes::EXTERNAL_SCORING_FAILED, "External assessment failed")
                .with_details(format!("model={}; err={}", self.model, e))
                .with_retryable(e.retryable)
        })
    }
}
