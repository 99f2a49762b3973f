use arx_core::error::AppError;

pub mod ollama_llm;

/// Text completion collaborator used for drafting and for external assessment.
pub trait Llm: Send + Sync {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError>;
}
