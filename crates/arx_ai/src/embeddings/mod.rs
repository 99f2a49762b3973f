use arx_core::error::AppError;

pub mod ollama_embed;

/// Text-to-vector collaborator. Every call within one process must return the same dimension
/// for a given model.
pub trait Embedder: Send + Sync {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError>;

    /// Embeds `inputs` in order. The default issues one `embed` call per input.
    fn embed_batch(&self, model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        inputs.iter().map(|text| self.embed(model, text)).collect()
    }
}
