use std::time::Duration;

use arx_core::error::{codes, AppError};
use serde::{Deserialize, Serialize};

use super::Llm;
use crate::ollama::OllamaClient;

const GENERATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Non-streaming completions from Ollama's `/api/generate`.
#[derive(Debug, Clone)]
pub struct OllamaLlm {
    client: OllamaClient,
    options: GenerateOptions,
}

#[derive(Debug, Clone, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaLlm {
    pub fn new(client: OllamaClient) -> Self {
        Self {
            client,
            options: GenerateOptions::default(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    /// Upper bound on generated tokens.
    pub fn with_max_tokens(mut self, num_predict: u32) -> Self {
        self.options.num_predict = Some(num_predict);
        self
    }
}

impl Llm for OllamaLlm {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError> {
        let req = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: &self.options,
        };
        let resp: GenerateResponse = self.client.post_json(
            "/api/generate",
            &req,
            GENERATE_TIMEOUT,
            codes::GENERATION_FAILED,
        )?;
        if resp.response.trim().is_empty() {
            return Err(
                AppError::new(codes::GENERATION_FAILED, "Model response was empty")
                    .with_details(format!("model={model}")),
            );
        }
        Ok(resp.response)
    }
}
