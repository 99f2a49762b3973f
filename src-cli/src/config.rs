//! `argumentrx.toml` loading.
//!
//! Every key has a default, so an empty file (or no file) is a valid configuration. Credentials
//! never live in the file itself: provider sections name the environment variables to read.

use std::fs;
use std::path::{Path, PathBuf};

use arx_core::error::AppError;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "argumentrx.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ollama: OllamaSection,
    pub retrieval: RetrievalSection,
    pub generation: GenerationSection,
    pub scoring: ScoringSection,
    pub providers: ProvidersSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSection {
    pub base_url: String,
    pub embedding_model: String,
    pub llm_model: String,
}

impl Default for OllamaSection {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            embedding_model: "all-minilm".to_string(),
            llm_model: "llama3.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSection {
    pub top_k: usize,
    pub per_provider_limit: usize,
    pub index_dir: PathBuf,
    pub reuse_cached_index: bool,
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            top_k: 10,
            per_provider_limit: 5,
            index_dir: PathBuf::from("data/index"),
            reuse_cached_index: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSection {
    pub max_sources_per_argument: usize,
    pub argument_max_words: usize,
    pub temperature: f32,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            max_sources_per_argument: 5,
            argument_max_words: 500,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSection {
    /// Blend in a model-based assessment on top of the rule-based scores.
    pub external_judge: bool,
    pub judge_temperature: f32,
    pub judge_max_tokens: u32,
}

impl Default for ScoringSection {
    fn default() -> Self {
        Self {
            external_judge: true,
            judge_temperature: 0.3,
            judge_max_tokens: 300,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersSection {
    pub news: NewsSection,
    pub forum: ForumSection,
    pub blog: BlogSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSection {
    pub enabled: bool,
    pub api_key_env: String,
    pub language: String,
}

impl Default for NewsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key_env: "NEWS_API_KEY".to_string(),
            language: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForumSection {
    pub enabled: bool,
    pub client_id_env: String,
    pub client_secret_env: String,
    pub user_agent: String,
    pub subreddits: Vec<String>,
}

impl Default for ForumSection {
    fn default() -> Self {
        Self {
            enabled: true,
            client_id_env: "REDDIT_CLIENT_ID".to_string(),
            client_secret_env: "REDDIT_CLIENT_SECRET".to_string(),
            user_agent: "ArgumentRx/1.0".to_string(),
            subreddits: ["cryptocurrency", "Bitcoin", "ethereum", "CryptoCurrency"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogSection {
    pub enabled: bool,
    pub feeds: Vec<String>,
}

impl Default for BlogSection {
    fn default() -> Self {
        Self {
            enabled: true,
            feeds: [
                "https://www.coindesk.com/arc/outboundfeeds/rss/",
                "https://cointelegraph.com/rss",
                "https://decrypt.co/feed",
                "https://www.theblock.co/rss.xml",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::new("ARX_CONFIG_INVALID", message)
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        let config: Config = toml::from_str(text)
            .map_err(|e| invalid("Failed to parse configuration").with_details(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path).map_err(|e| {
            invalid("Failed to read configuration file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        Self::from_toml_str(&text).map_err(|mut e| {
            e.details = Some(match e.details.take() {
                Some(d) => format!("path={}; {d}", path.display()),
                None => format!("path={}", path.display()),
            });
            e
        })
    }

    /// Explicit path (flag or `ARGUMENTRX_CONFIG`), else `argumentrx.toml` in `cwd`, else defaults.
    pub fn resolve(explicit: Option<&Path>, cwd: &Path) -> Result<Self, AppError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let local = cwd.join(CONFIG_FILE_NAME);
        if local.is_file() {
            return Self::from_file(&local);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let positive = [
            ("retrieval.top_k", self.retrieval.top_k),
            ("retrieval.per_provider_limit", self.retrieval.per_provider_limit),
            (
                "generation.max_sources_per_argument",
                self.generation.max_sources_per_argument,
            ),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(invalid("Configuration value must be at least 1")
                    .with_details(format!("key={key}")));
            }
        }
        Ok(())
    }
}

/// Value of the environment variable `name`, if set and non-empty.
pub fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
