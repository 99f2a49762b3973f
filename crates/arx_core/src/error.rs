//! The one error type every layer returns.
//!
//! Codes are stable `ARX_*` strings so callers can branch on them and so they can be shown to
//! users verbatim. `retryable` marks transient conditions such as network failures.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod codes {
    pub const INVALID_INPUT: &str = "ARX_INVALID_INPUT";
    pub const PROVIDER_UNAVAILABLE: &str = "ARX_PROVIDER_UNAVAILABLE";
    pub const INDEX_UNAVAILABLE: &str = "ARX_INDEX_UNAVAILABLE";
    pub const EXTERNAL_SCORING_FAILED: &str = "ARX_EXTERNAL_SCORING_FAILED";
    pub const GENERATION_FAILED: &str = "ARX_GENERATION_FAILED";
    pub const NO_EVIDENCE: &str = "ARX_NO_EVIDENCE";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default)]
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        AppError {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(self, details: impl Into<String>) -> Self {
        AppError {
            details: Some(details.into()),
            ..self
        }
    }

    pub fn with_retryable(self, retryable: bool) -> Self {
        AppError { retryable, ..self }
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

/// `[CODE] message`, followed by ` (details)` when details are present.
impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}
