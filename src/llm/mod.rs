pub mod anthropic;
pub mod cache;
pub mod client;
pub mod openai;

use std::sync::Arc;

use thiserror::Error;

use crate::config::Config;
use crate::error::{AppError, AppResult};

pub use cache::ResponseCache;
pub use client::LlmClient;

/// Fixed system instruction sent with every report prompt.
pub const SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenerateRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct GenerateResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub finish_reason: String,
}

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM service is disabled")]
    Disabled,

    #[error("invalid API key header: {0}")]
    InvalidCredential(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("{provider} client error: {message}")]
    Upstream { provider: String, message: String },

    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("completion contained no text")]
    EmptyCompletion,
}

impl LlmError {
    /// Short label recorded as `error.type` on spans and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Disabled => "disabled",
            LlmError::InvalidCredential(_) => "auth_error",
            LlmError::EmptyCompletion => "empty_completion",
            LlmError::Api { status, .. } => match *status {
                401 | 403 => "auth_error",
                429 => "rate_limit",
                400 | 404 | 422 => "invalid_request",
                500..=599 => "server_error",
                _ => "unknown_error",
            },
            LlmError::Transport(msg) | LlmError::Upstream { message: msg, .. } => {
                classify_message(msg)
            }
        }
    }
}

fn classify_message(msg: &str) -> &'static str {
    let msg = msg.to_lowercase();
    if msg.contains("rate limit") || msg.contains("429") {
        "rate_limit"
    } else if msg.contains("timeout") || msg.contains("timed out") || msg.contains("deadline") {
        "timeout"
    } else if msg.contains("401")
        || msg.contains("403")
        || msg.contains("auth")
        || msg.contains("api key")
    {
        "auth_error"
    } else if msg.contains("connect")
        || msg.contains("dns")
        || msg.contains("network")
        || msg.contains("reset")
    {
        "network_error"
    } else if msg.contains("500")
        || msg.contains("502")
        || msg.contains("503")
        || msg.contains("server")
    {
        "server_error"
    } else {
        "unknown_error"
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Transport(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, LlmError>;
    fn name(&self) -> &str;
}

/// Builds the provider named by `LLM_PROVIDER`, with its credential and
/// optional base URL override.
pub fn provider_from_config(config: &Config) -> AppResult<Arc<dyn Provider>> {
    let missing_key = |var: &str| AppError::Config(format!("{var} must be set"));

    match config.llm_provider.as_str() {
        "openai" => {
            let key = config
                .openai_api_key
                .as_deref()
                .ok_or_else(|| missing_key("OPENAI_API_KEY"))?;
            Ok(match &config.llm_base_url {
                Some(base_url) => Arc::new(openai::OpenAIProvider::with_base_url(key, base_url)),
                None => Arc::new(openai::OpenAIProvider::new(key)),
            })
        }
        "anthropic" => {
            let key = config
                .anthropic_api_key
                .as_deref()
                .ok_or_else(|| missing_key("ANTHROPIC_API_KEY"))?;
            Ok(match &config.llm_base_url {
                Some(base_url) => {
                    Arc::new(anthropic::AnthropicProvider::with_base_url(key, base_url))
                }
                None => Arc::new(anthropic::AnthropicProvider::new(key)),
            })
        }
        other => Err(AppError::Config(format!("unsupported LLM_PROVIDER {other:?}"))),
    }
}
