use std::time::Duration;

use arx_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::ollama::OllamaClient;

const EMBED_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_PROMPT_BYTES: usize = 12_000;
const CODE: &str = "ARX_EMBEDDINGS_FAILED";

/// Embeddings from Ollama's `/api/embeddings`, one request per text.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

/// Longest prefix of `input` within `max_bytes` that ends on a char boundary.
fn bounded_prompt(input: &str, max_bytes: usize) -> &str {
    if input.len() <= max_bytes {
        return input;
    }
    let mut end = max_bytes;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    &input[..end]
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        let req = EmbeddingsRequest {
            model,
            prompt: bounded_prompt(input, MAX_PROMPT_BYTES),
        };
        let resp: EmbeddingsResponse =
            self.client
                .post_json("/api/embeddings", &req, EMBED_TIMEOUT, CODE)?;
        if resp.embedding.is_empty() {
            return Err(AppError::new(CODE, "Ollama returned an empty embedding")
                .with_details(format!("model={model}")));
        }
        Ok(resp.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::bounded_prompt;

    #[test]
    fn bounded_prompt_respects_char_boundaries() {
        assert_eq!(bounded_prompt("abc", 10), "abc");
        assert_eq!(bounded_prompt("héllo", 2), "h");
        assert_eq!(bounded_prompt("héllo", 3), "hé");
    }
}
