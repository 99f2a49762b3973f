//! Minimal HTTP client for a local Ollama server.
//!
//! Only `http://127.0.0.1[:port]` is accepted, so evidence text and arguments never leave the
//! machine through this client.

use std::time::Duration;

use arx_core::error::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;

const LOCAL_ORIGIN: &str = "http://127.0.0.1";
const HEALTH_TIMEOUT: Duration = Duration::from_millis(800);

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
}

/// Exactly the local origin, optionally followed by `:port` with a port in 1..=65535.
fn is_local_base_url(base_url: &str) -> bool {
    let Some(rest) = base_url.strip_prefix(LOCAL_ORIGIN) else {
        return false;
    };
    if rest.is_empty() {
        return true;
    }
    let Some(port) = rest.strip_prefix(':') else {
        return false;
    };
    !port.is_empty()
        && port.bytes().all(|b| b.is_ascii_digit())
        && matches!(port.parse::<u32>(), Ok(p) if (1..=65_535).contains(&p))
}

fn call_error(code: &str, path: &str, err: ureq::Error) -> AppError {
    match err {
        ureq::Error::Status(status, _) => AppError::new(code, "Ollama rejected the request")
            .with_details(format!("path={path}; status={status}")),
        other => AppError::new(code, "Failed to reach Ollama on 127.0.0.1")
            .with_details(format!("path={path}; err={other}"))
            .with_retryable(true),
    }
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/');
        if !is_local_base_url(base_url) {
            return Err(AppError::new(
                "ARX_REMOTE_NOT_ALLOWED",
                "Ollama base URL must be http://127.0.0.1 with an optional port",
            )
            .with_details(format!("base_url={base_url}")));
        }
        Ok(Self {
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let path = "/api/tags";
        let resp = ureq::get(&self.endpoint(path))
            .timeout(HEALTH_TIMEOUT)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(status, _) => {
                    AppError::new("ARX_OLLAMA_UNHEALTHY", "Ollama health check failed")
                        .with_details(format!("status={status}"))
                }
                other => call_error("ARX_OLLAMA_UNREACHABLE", path, other),
            })?;
        if resp.status() != 200 {
            return Err(
                AppError::new("ARX_OLLAMA_UNHEALTHY", "Ollama health check failed")
                    .with_details(format!("status={}", resp.status())),
            );
        }
        Ok(())
    }

    /// POST `body` as JSON to `path` and decode the JSON reply. Every failure carries `code`.
    pub(crate) fn post_json<B, R>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
        code: &str,
    ) -> Result<R, AppError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_value(body).map_err(|e| {
            AppError::new(code, "Failed to encode Ollama request")
                .with_details(format!("path={path}; err={e}"))
        })?;
        let resp = ureq::post(&self.endpoint(path))
            .timeout(timeout)
            .send_json(payload)
            .map_err(|e| call_error(code, path, e))?;
        resp.into_json::<R>().map_err(|e| {
            AppError::new(code, "Failed to decode Ollama response")
                .with_details(format!("path={path}; err={e}"))
        })
    }
}
